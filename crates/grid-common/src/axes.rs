//! Coordinate axes of a regular lat/lon grid.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Factor applied to the inverse resolution before rounding so that values
/// sitting numerically on a cell boundary do not flicker between adjacent
/// cells.
const SNAP_EPSILON: f64 = 1.00001;

/// The coordinate axes of a regular lat/lon grid.
///
/// Latitude and longitude arrays are taken from dataset metadata; the
/// resolution is derived once from the coordinate extremes and the point
/// count, and is constant across the axis. A grid with `is_global` set is
/// periodic in longitude (its axis covers `[0°, 360°)` and windows may wrap
/// at the seam).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridAxes {
    lats: Vec<f64>,
    lons: Vec<f64>,
    resolution: (f64, f64),
    is_global: bool,
}

impl GridAxes {
    /// Build axes from coordinate arrays.
    ///
    /// Both arrays must hold at least two strictly increasing, finite
    /// values; otherwise an `InvalidAxis` error is returned.
    pub fn from_coords(lats: Vec<f64>, lons: Vec<f64>, is_global: bool) -> GridResult<Self> {
        validate_axis("lat", &lats)?;
        validate_axis("lon", &lons)?;

        let dlat = (lats[lats.len() - 1] - lats[0]) / (lats.len() - 1) as f64;
        let dlon = (lons[lons.len() - 1] - lons[0]) / (lons.len() - 1) as f64;

        Ok(Self {
            lats,
            lons,
            resolution: (dlat, dlon),
            is_global,
        })
    }

    /// Latitude coordinates, south to north.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitude coordinates, west to east.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Grid resolution in degrees per point, as `(dlat, dlon)`.
    pub fn resolution(&self) -> (f64, f64) {
        self.resolution
    }

    /// Whether the longitude axis is periodic (global coverage).
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    /// Number of latitude points.
    pub fn nlat(&self) -> usize {
        self.lats.len()
    }

    /// Number of longitude points.
    pub fn nlon(&self) -> usize {
        self.lons.len()
    }

    /// Snap a latitude to the nearest grid-resolution multiple.
    pub fn snap_lat(&self, lat: f64) -> f64 {
        snap_to_resolution(lat, self.resolution.0)
    }

    /// Snap a longitude to the nearest grid-resolution multiple.
    pub fn snap_lon(&self, lon: f64) -> f64 {
        snap_to_resolution(lon, self.resolution.1)
    }

    /// Coordinate ranges from which sample centers may be drawn, shrunk so
    /// that a neighborhood of `(lat_extent, lon_extent)` degrees around any
    /// center stays on the grid.
    ///
    /// Latitude is always shrunk by half the extent on each side. Longitude
    /// is only shrunk for non-periodic grids; on a periodic grid windows wrap
    /// instead of running off the axis.
    pub fn sampling_ranges(
        &self,
        lat_extent: f64,
        lon_extent: f64,
    ) -> GridResult<((f64, f64), (f64, f64))> {
        let lat_range = (
            self.lats[0] + lat_extent / 2.0,
            self.lats[self.lats.len() - 1] - lat_extent / 2.0,
        );
        if lat_range.0 >= lat_range.1 {
            return Err(GridError::NeighborhoodTooLarge {
                axis: "lat",
                extent: lat_extent,
                span: self.lats[self.lats.len() - 1] - self.lats[0],
            });
        }

        let mut lon_range = (self.lons[0], self.lons[self.lons.len() - 1]);
        if !self.is_global {
            lon_range = (lon_range.0 + lon_extent / 2.0, lon_range.1 - lon_extent / 2.0);
            if lon_range.0 >= lon_range.1 {
                return Err(GridError::NeighborhoodTooLarge {
                    axis: "lon",
                    extent: lon_extent,
                    span: self.lons[self.lons.len() - 1] - self.lons[0],
                });
            }
        }

        Ok((lat_range, lon_range))
    }
}

/// Snap a coordinate to the nearest multiple of the grid resolution.
pub fn snap_to_resolution(value: f64, resolution: f64) -> f64 {
    let res_inv = 1.0 / resolution * SNAP_EPSILON;
    resolution * (value * res_inv).round()
}

fn validate_axis(name: &str, coords: &[f64]) -> GridResult<()> {
    if coords.len() < 2 {
        return Err(GridError::invalid_axis(format!(
            "{name} axis needs at least 2 points, got {}",
            coords.len()
        )));
    }
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(GridError::invalid_axis(format!(
            "{name} axis contains a non-finite coordinate"
        )));
    }
    if coords.windows(2).any(|w| w[0] >= w[1]) {
        return Err(GridError::invalid_axis(format!(
            "{name} axis must be strictly increasing"
        )));
    }
    Ok(())
}
