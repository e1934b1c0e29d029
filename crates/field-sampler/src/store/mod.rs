//! Read-only access to chunked `(time, field, level, lat, lon)` datasets.

mod memory;
mod zarr;

pub use memory::MemoryStore;
pub use zarr::ZarrDataStore;

use chrono::{DateTime, Utc};
use ndarray::Array5;

use crate::error::Result;

/// A read-only, chunked multi-field dataset.
///
/// The data array has axes `(time, field, level, lat, lon)`; coordinate
/// arrays and catalog attributes are available without touching the bulk
/// data. Implementations must be safe for concurrent read-only access from
/// multiple workers; this crate never writes through the trait.
pub trait DataStore: Send + Sync {
    /// Shape of the data array as `[time, field, level, lat, lon]`.
    fn shape(&self) -> [usize; 5];

    /// Field names, in storage order.
    fn fields(&self) -> &[String];

    /// Vertical level identifiers, in storage order.
    fn levels(&self) -> &[i64];

    /// Whether the longitude axis is periodic (global coverage).
    fn is_global(&self) -> bool;

    /// Latitude coordinates, south to north.
    fn lats(&self) -> &[f64];

    /// Longitude coordinates, west to east.
    fn lons(&self) -> &[f64];

    /// Time coordinate of every time index.
    fn times(&self) -> &[DateTime<Utc>];

    /// Read the raw block covering the given time, field and level indices
    /// at full spatial extent.
    ///
    /// The result has shape `(time_indices.len(), field_indices.len(),
    /// level_indices.len(), nlat, nlon)` with axes ordered as requested.
    /// Blocking; failures are fatal for the caller and are never retried
    /// here.
    fn read_block(
        &self,
        time_indices: &[usize],
        field_indices: &[usize],
        level_indices: &[usize],
    ) -> Result<Array5<f32>>;
}
