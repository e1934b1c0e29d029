//! Output types of the iteration engine.

use chrono::{DateTime, Utc};

/// Coordinate metadata of one extracted sample, handed to the batch
/// assembler alongside the raw tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    /// Time coordinate of every step of the window, ascending.
    pub times: Vec<DateTime<Utc>>,
    /// Vertical level identifiers, in output order.
    pub levels: Vec<i64>,
    /// Latitude coordinates of the selected rows.
    pub lats: Vec<f64>,
    /// Longitude coordinates of the selected columns (wrap order preserved).
    pub lons: Vec<f64>,
    /// Grid resolution as `(dlat, dlon)`.
    pub resolution: (f64, f64),
}

/// The exact index sets used to cut one sample out of the raw array.
///
/// Only produced when tracing is enabled in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIndices {
    pub time_indices: Vec<usize>,
    pub lat_indices: Vec<usize>,
    pub lon_indices: Vec<usize>,
}

/// Reserved slot for target-field batches.
///
/// Target sampling is not implemented; this type is uninhabited so the slot
/// exists in the output shape without any invented semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetBatch {}

/// One batch emitted by an epoch iterator.
#[derive(Debug)]
pub struct SampleBatch<B> {
    /// Assembled source batch, as returned by the batch assembler.
    pub sources: B,
    /// Reserved; always `None`.
    pub target: Option<TargetBatch>,
    /// Per-sample index traces, when requested.
    pub source_indices: Option<Vec<SourceIndices>>,
}
