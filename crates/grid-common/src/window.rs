//! Index selection for spatiotemporal sampling windows.

use crate::error::{GridError, GridResult};

/// Compute the strided look-back time window ending strictly before `center`.
///
/// Returns `len` indices `[center - len*stride, ..., center - stride]` in
/// ascending order. Fails if the window would reach before index 0.
pub fn time_window(center: usize, len: usize, stride: usize) -> GridResult<Vec<usize>> {
    let required = len * stride;
    if center < required {
        return Err(GridError::TimeWindowUnderflow { center, required });
    }
    Ok((1..=len).rev().map(|n| center - n * stride).collect())
}

/// Select the latitude indices of a window of `extent` degrees around
/// `center`.
///
/// The lower bound carries an extra half-resolution offset; without it the
/// discretized selection gains or loses a row depending on where the snapped
/// center falls, and the selected count must match the configured
/// neighborhood width exactly.
pub fn lat_window(lats: &[f64], center: f64, extent: f64, resolution: f64) -> Vec<usize> {
    let half = extent / 2.0;
    let lo = center - half - resolution / 2.0;
    let hi = center + half;
    lats.iter()
        .enumerate()
        .filter(|(_, &lat)| lat > lo && lat < hi)
        .map(|(i, _)| i)
        .collect()
}

/// Select the longitude indices of a window of `extent` degrees around
/// `center` on a `[0°, 360°)` axis.
///
/// A window reaching past either edge wraps around the seam and comes back
/// as two concatenated index runs (west piece first for an east-edge
/// overflow, east piece first for a west-edge overflow, matching the scan
/// order of the underlying axis). A window that would overflow both edges at
/// once is rejected: the neighborhood is wider than the domain allows and
/// continuing would silently select a degenerate window.
pub fn lon_window(lons: &[f64], center: f64, extent: f64, resolution: f64) -> GridResult<Vec<usize>> {
    let half = extent / 2.0;
    if center - half < 0.0 && center + half > 360.0 {
        return Err(GridError::WindowWrapsBothEdges {
            west: center - half,
            east: center + half,
        });
    }

    // Same asymmetric half-resolution offset as the latitude selection.
    let il = center - half - resolution / 2.0;
    let ir = center + half;

    let select = |lo: f64, hi: f64| -> Vec<usize> {
        lons.iter()
            .enumerate()
            .filter(|(_, &lon)| lon > lo && lon < hi)
            .map(|(i, _)| i)
            .collect()
    };

    if il < 0.0 {
        // Wrap at the west edge: tail of the axis, then the head.
        let mut indices = select(il + 360.0, f64::INFINITY);
        indices.extend(select(f64::NEG_INFINITY, ir));
        Ok(indices)
    } else if ir > 360.0 {
        // Wrap at the east edge: end of the axis, then the wrapped start.
        let mut indices = select(il, f64::INFINITY);
        indices.extend(select(f64::NEG_INFINITY, ir - 360.0));
        Ok(indices)
    } else {
        Ok(select(il, ir))
    }
}
