//! Error types for grid geometry.

use thiserror::Error;

/// Result type alias using GridError.
pub type GridResult<T> = std::result::Result<T, GridError>;

/// Errors raised by grid geometry operations.
#[derive(Debug, Error)]
pub enum GridError {
    /// A coordinate axis is unusable (too short, non-monotonic, NaN, ...).
    #[error("invalid coordinate axis: {0}")]
    InvalidAxis(String),

    /// The requested neighborhood does not fit on a finite axis.
    #[error("neighborhood extent {extent}° exceeds usable span of the {axis} axis ({span}°)")]
    NeighborhoodTooLarge {
        axis: &'static str,
        extent: f64,
        span: f64,
    },

    /// A look-back time window would reach before the first time index.
    #[error("time window underflow: center index {center} requires {required} preceding steps")]
    TimeWindowUnderflow { center: usize, required: usize },

    /// A longitude window would need to wrap at both the west and east edge
    /// at once. The neighborhood width is contradictory for the domain.
    #[error("longitude window [{west}°, {east}°] wraps both edges of the [0°, 360°) domain")]
    WindowWrapsBothEdges { west: f64, east: f64 },
}

impl GridError {
    /// Create an InvalidAxis error.
    pub fn invalid_axis(msg: impl Into<String>) -> Self {
        Self::InvalidAxis(msg.into())
    }
}
