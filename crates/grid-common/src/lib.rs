//! Geometry of regular lat/lon grids used by the windowed sampling engine.
//!
//! This crate is pure arithmetic: coordinate axes with a derived resolution,
//! snapping of continuous coordinates onto the grid, and selection of the
//! index sets that make up a spatiotemporal sampling window (including
//! longitude wrap at the 0°/360° seam). It performs no I/O and owns no
//! random state.

pub mod axes;
pub mod error;
pub mod window;

pub use axes::{snap_to_resolution, GridAxes};
pub use error::{GridError, GridResult};
pub use window::{lat_window, lon_window, time_window};
