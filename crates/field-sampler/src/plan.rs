//! Per-epoch random placement of sample centers.

use std::ops::Range;

use grid_common::snap_to_resolution;
use rand::seq::SliceRandom;
use rand::Rng;

/// The coordinate and time ranges sample centers may be drawn from.
///
/// Spatial ranges are already shrunk so any neighborhood around a drawn
/// center stays on the grid; the time range excludes indices whose look-back
/// window would underflow the first time index.
#[derive(Debug, Clone)]
pub struct SamplingDomain {
    pub lat_range: (f64, f64),
    pub lon_range: (f64, f64),
    pub resolution: (f64, f64),
    pub time_indices: Range<usize>,
}

/// The complete set of random draws for one epoch.
///
/// Every worker draws the identical plan (same seed, same draw sequence) and
/// then consumes only its own slice of the batch indices, so the plan is the
/// only coordination between workers.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochPlan {
    batch_size: usize,
    /// One time index per batch, drawn without replacement.
    time_block_centers: Vec<usize>,
    /// One snapped (lat, lon) center per sample, drawn with replacement.
    centers: Vec<(f64, f64)>,
}

impl EpochPlan {
    /// Draw the plan for one epoch.
    ///
    /// Time-block centers are a truncated permutation of the valid time
    /// range (no repeats within an epoch); spatial centers are independent
    /// uniform draws snapped to the grid resolution.
    pub fn draw<R: Rng + ?Sized>(
        rng: &mut R,
        domain: &SamplingDomain,
        num_samples: usize,
        batch_size: usize,
    ) -> Self {
        let num_batches = num_samples / batch_size;

        let mut time_block_centers: Vec<usize> = domain.time_indices.clone().collect();
        time_block_centers.shuffle(rng);
        time_block_centers.truncate(num_batches);

        let centers = (0..num_samples)
            .map(|_| {
                let lat = rng.gen::<f64>() * (domain.lat_range.1 - domain.lat_range.0)
                    + domain.lat_range.0;
                let lon = rng.gen::<f64>() * (domain.lon_range.1 - domain.lon_range.0)
                    + domain.lon_range.0;
                (
                    snap_to_resolution(lat, domain.resolution.0),
                    snap_to_resolution(lon, domain.resolution.1),
                )
            })
            .collect();

        Self {
            batch_size,
            time_block_centers,
            centers,
        }
    }

    /// Number of batches in this plan.
    pub fn num_batches(&self) -> usize {
        self.time_block_centers.len()
    }

    /// Samples per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Time index anchoring batch `bidx` (right edge of its window).
    pub fn time_block_center(&self, bidx: usize) -> usize {
        self.time_block_centers[bidx]
    }

    /// Snapped spatial center of sample `sidx` within batch `bidx`.
    pub fn center(&self, bidx: usize, sidx: usize) -> (f64, f64) {
        self.centers[bidx * self.batch_size + sidx]
    }
}
