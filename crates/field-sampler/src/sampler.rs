//! The windowed sampling engine.
//!
//! A [`MultifieldSampler`] is built once against a dataset; every call to
//! [`begin_epoch`](MultifieldSampler::begin_epoch) draws a fresh random plan
//! from the sampler's own seeded generator and returns a finite, lazy
//! [`EpochIter`] over this worker's share of the plan. Nothing about the
//! epoch is process-global: the plan lives in the iterator and dies with it.

use std::ops::Range;

use chrono::Datelike;
use ndarray::{Array5, Array6, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grid_common::{lat_window, lon_window, time_window, GridAxes};

use crate::catalog::FieldCatalog;
use crate::config::SamplerConfig;
use crate::error::{Result, SamplerError};
use crate::normalize::{NormalizerFactory, SpatialWindow};
use crate::partition::{worker_range, WorkerSplit};
use crate::plan::{EpochPlan, SamplingDomain};
use crate::store::DataStore;
use crate::types::{SampleBatch, SourceIndices, SourceInfo};

/// Turns one batch of raw samples into whatever the consumer trains on.
///
/// Called once per batch with the stacked raw tensor of shape `(sample,
/// time, field, level, lat, lon)` and one [`SourceInfo`] per sample.
pub trait BatchAssembler {
    type Output;

    fn assemble(&mut self, sources: Array6<f32>, infos: &[SourceInfo]) -> Self::Output;
}

impl<B, F> BatchAssembler for F
where
    F: FnMut(Array6<f32>, &[SourceInfo]) -> B,
{
    type Output = B;

    fn assemble(&mut self, sources: Array6<f32>, infos: &[SourceInfo]) -> B {
        self(sources, infos)
    }
}

/// Assembler that hands back the stacked tensor and metadata unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBatchAssembler;

impl BatchAssembler for RawBatchAssembler {
    type Output = (Array6<f32>, Vec<SourceInfo>);

    fn assemble(&mut self, sources: Array6<f32>, infos: &[SourceInfo]) -> Self::Output {
        (sources, infos.to_vec())
    }
}

/// Samples spatiotemporal neighborhoods from a multi-field gridded time
/// series.
pub struct MultifieldSampler<S, A> {
    store: S,
    assembler: A,
    axes: GridAxes,
    catalog: FieldCatalog,
    domain: SamplingDomain,
    config: SamplerConfig,
    rng: ChaCha8Rng,
}

impl<S: DataStore, A: BatchAssembler> MultifieldSampler<S, A> {
    /// Build a sampler against a dataset.
    ///
    /// Resolves the field/level catalog, derives the grid axes and the
    /// shrunk sampling domain, and fixes the random seed. All configuration
    /// and catalog mismatches surface here, not during iteration.
    pub fn new(
        store: S,
        config: SamplerConfig,
        factory: &dyn NormalizerFactory,
        assembler: A,
    ) -> Result<Self> {
        config.validate()?;

        let shape = store.shape();
        let axes = GridAxes::from_coords(
            store.lats().to_vec(),
            store.lons().to_vec(),
            store.is_global(),
        )?;
        if axes.nlat() != shape[3] || axes.nlon() != shape[4] {
            return Err(SamplerError::shape(format!(
                "coordinate axes ({}, {}) do not match data extent ({}, {})",
                axes.nlat(),
                axes.nlon(),
                shape[3],
                shape[4]
            )));
        }
        if store.times().len() != shape[0] {
            return Err(SamplerError::shape(format!(
                "time axis length {} does not match data extent {}",
                store.times().len(),
                shape[0]
            )));
        }

        let catalog = FieldCatalog::resolve(
            store.fields(),
            store.levels(),
            (shape[0], shape[3], shape[4]),
            &config,
            factory,
        )?;

        let (lat_range, lon_range) = axes.sampling_ranges(
            config.neighborhood.lat_degrees,
            config.neighborhood.lon_degrees,
        )?;

        // Only time indices that admit a full look-back window are valid
        // block centers.
        let lead = config.neighborhood.time_steps * config.time_sampling;
        if lead >= shape[0] {
            return Err(SamplerError::config(format!(
                "time axis ({} steps) is shorter than one look-back window ({lead} steps)",
                shape[0]
            )));
        }
        let time_indices = lead..shape[0];

        let num_batches = config.samples_per_epoch / config.batch_size;
        if time_indices.len() < num_batches {
            return Err(SamplerError::config(format!(
                "epoch needs {num_batches} distinct time blocks but only {} are available",
                time_indices.len()
            )));
        }

        let seed = config.rng_seed.unwrap_or_else(rand::random);
        tracing::info!(
            seed,
            num_batches,
            fields = config.fields.len(),
            levels = config.levels.len(),
            is_global = axes.is_global(),
            "sampler constructed"
        );

        Ok(Self {
            store,
            assembler,
            domain: SamplingDomain {
                lat_range,
                lon_range,
                resolution: axes.resolution(),
                time_indices,
            },
            axes,
            catalog,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Batches emitted per epoch across the whole worker pool.
    pub fn batches_per_epoch(&self) -> usize {
        self.config.samples_per_epoch / self.config.batch_size
    }

    /// The sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Start a new epoch: draw a fresh plan and return the iterator over
    /// this worker's slice of its batches.
    ///
    /// Every worker of a pool must call this with the same construction
    /// seed and pass its own [`WorkerSplit`]; all workers then agree on the
    /// plan and consume disjoint slices. `None` assigns the full epoch.
    pub fn begin_epoch(&mut self, split: Option<WorkerSplit>) -> EpochIter<'_, S, A> {
        let plan = EpochPlan::draw(
            &mut self.rng,
            &self.domain,
            self.config.samples_per_epoch,
            self.config.batch_size,
        );
        let batches = worker_range(plan.num_batches(), split);
        tracing::debug!(
            total_batches = plan.num_batches(),
            start = batches.start,
            end = batches.end,
            "epoch started"
        );

        EpochIter {
            store: &self.store,
            assembler: &mut self.assembler,
            axes: &self.axes,
            catalog: &self.catalog,
            config: &self.config,
            plan,
            batches,
        }
    }
}

/// A finite, lazy iterator over one worker's batches of one epoch.
///
/// Each step performs one storage read covering the whole batch's time
/// window, then cuts, normalizes and stacks `batch_size` spatial samples
/// from it. Dropping the iterator early is the only cancellation needed;
/// no state outlives it.
pub struct EpochIter<'a, S: DataStore, A: BatchAssembler> {
    store: &'a S,
    assembler: &'a mut A,
    axes: &'a GridAxes,
    catalog: &'a FieldCatalog,
    config: &'a SamplerConfig,
    plan: EpochPlan,
    batches: Range<usize>,
}

impl<S: DataStore, A: BatchAssembler> EpochIter<'_, S, A> {
    /// Batches left in this worker's slice.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }

    fn emit_batch(&mut self, bidx: usize) -> Result<SampleBatch<A::Output>> {
        let nbr = &self.config.neighborhood;
        let (dlat, dlon) = self.axes.resolution();

        let block_center = self.plan.time_block_center(bidx);
        let time_indices = time_window(block_center, nbr.time_steps, self.config.time_sampling)?;

        // One storage read serves all samples of the batch.
        let block = self.store.read_block(
            &time_indices,
            self.catalog.field_indices(),
            self.catalog.level_indices(),
        )?;

        // Normalization statistics are keyed by the window's last time
        // point, even when the window spans a month boundary.
        let stamp = self.store.times()[time_indices[time_indices.len() - 1]];
        let (year, month) = (stamp.year(), stamp.month());

        let mut samples: Vec<Array5<f32>> = Vec::with_capacity(self.config.batch_size);
        let mut infos: Vec<SourceInfo> = Vec::with_capacity(self.config.batch_size);
        let mut traces = self
            .config
            .trace_source_indices
            .then(|| Vec::with_capacity(self.config.batch_size));

        for sidx in 0..self.config.batch_size {
            let (center_lat, center_lon) = self.plan.center(bidx, sidx);
            let lat_indices = lat_window(self.axes.lats(), center_lat, nbr.lat_degrees, dlat);
            let lon_indices = lon_window(self.axes.lons(), center_lon, nbr.lon_degrees, dlon)?;

            let mut sample = block
                .select(Axis(3), &lat_indices)
                .select(Axis(4), &lon_indices);

            let window = SpatialWindow {
                lat_indices: &lat_indices,
                lon_indices: &lon_indices,
            };
            self.catalog.normalize_sample(year, month, &mut sample, &window);

            infos.push(SourceInfo {
                times: time_indices
                    .iter()
                    .map(|&t| self.store.times()[t])
                    .collect(),
                levels: self.catalog.level_values().to_vec(),
                lats: lat_indices.iter().map(|&i| self.axes.lats()[i]).collect(),
                lons: lon_indices.iter().map(|&i| self.axes.lons()[i]).collect(),
                resolution: (dlat, dlon),
            });
            if let Some(traces) = traces.as_mut() {
                traces.push(SourceIndices {
                    time_indices: time_indices.clone(),
                    lat_indices,
                    lon_indices,
                });
            }
            samples.push(sample);
        }

        let views: Vec<_> = samples.iter().map(|s| s.view()).collect();
        let stacked: Array6<f32> = ndarray::stack(Axis(0), &views)
            .map_err(|e| SamplerError::shape(format!("stacking batch {bidx}: {e}")))?;

        let sources = self.assembler.assemble(stacked, &infos);

        Ok(SampleBatch {
            sources,
            target: None,
            source_indices: traces,
        })
    }
}

impl<S: DataStore, A: BatchAssembler> Iterator for EpochIter<'_, S, A> {
    type Item = Result<SampleBatch<A::Output>>;

    fn next(&mut self) -> Option<Self::Item> {
        let bidx = self.batches.next()?;
        Some(self.emit_batch(bidx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.batches.len(), Some(self.batches.len()))
    }
}
