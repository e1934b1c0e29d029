//! Normalization of extracted samples.
//!
//! Each (field, level) pair owns one [`Normalizer`] instance, created through
//! a [`NormalizerFactory`] at catalog construction. Two implementations are
//! provided: [`GlobalNormalizer`] (one statistic pair per calendar month for
//! the whole domain) and [`LocalNormalizer`] (per-grid-cell statistics,
//! indexed through the window's spatial index sets).

use std::collections::HashMap;

use ndarray::{Array3, ArrayViewMut3};

use crate::config::FieldConfig;
use crate::config::NormalizationKind;
use crate::error::{Result, SamplerError};

/// Spatial index sets of one window, as selected on the full grid.
#[derive(Debug, Clone, Copy)]
pub struct SpatialWindow<'a> {
    pub lat_indices: &'a [usize],
    pub lon_indices: &'a [usize],
}

/// Rescales one (field, level) slice of a sample in place.
///
/// The statistics to apply are keyed by calendar `(year, month)`; the data
/// view covers `(time, lat, lon)` and must keep its shape.
pub trait Normalizer: Send + Sync + std::fmt::Debug {
    fn normalize(
        &self,
        year: i32,
        month: u32,
        data: ArrayViewMut3<'_, f32>,
        window: &SpatialWindow<'_>,
    );
}

/// Per-calendar-month mean and standard deviation, January first.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStats {
    pub mean: [f32; 12],
    pub std: [f32; 12],
}

impl MonthlyStats {
    /// The same (mean, std) pair for every month.
    pub fn constant(mean: f32, std: f32) -> Self {
        Self {
            mean: [mean; 12],
            std: [std; 12],
        }
    }

    /// Identity statistics (mean 0, std 1): normalization is a no-op.
    pub fn identity() -> Self {
        Self::constant(0.0, 1.0)
    }
}

/// Z-score normalization with one statistic pair per calendar month.
#[derive(Debug, Clone)]
pub struct GlobalNormalizer {
    stats: MonthlyStats,
}

impl GlobalNormalizer {
    pub fn new(stats: MonthlyStats) -> Self {
        Self { stats }
    }
}

impl Normalizer for GlobalNormalizer {
    fn normalize(
        &self,
        _year: i32,
        month: u32,
        mut data: ArrayViewMut3<'_, f32>,
        _window: &SpatialWindow<'_>,
    ) {
        let m = (month - 1) as usize;
        let mean = self.stats.mean[m];
        let std = self.stats.std[m];
        data.mapv_inplace(|v| (v - mean) / std);
    }
}

/// Z-score normalization with per-grid-cell monthly statistics.
///
/// The statistic arrays have shape `(12, nlat, nlon)` over the full grid;
/// the window's index sets map each cell of the extracted sample back to its
/// grid cell.
#[derive(Debug, Clone)]
pub struct LocalNormalizer {
    mean: Array3<f32>,
    std: Array3<f32>,
}

impl LocalNormalizer {
    /// Create a local normalizer; both arrays must share the same
    /// `(12, nlat, nlon)` shape.
    pub fn new(mean: Array3<f32>, std: Array3<f32>) -> Result<Self> {
        if mean.dim() != std.dim() {
            return Err(SamplerError::shape(format!(
                "local stats shapes differ: mean {:?} vs std {:?}",
                mean.dim(),
                std.dim()
            )));
        }
        if mean.dim().0 != 12 {
            return Err(SamplerError::shape(format!(
                "local stats need 12 months, got {}",
                mean.dim().0
            )));
        }
        Ok(Self { mean, std })
    }
}

impl Normalizer for LocalNormalizer {
    fn normalize(
        &self,
        _year: i32,
        month: u32,
        mut data: ArrayViewMut3<'_, f32>,
        window: &SpatialWindow<'_>,
    ) {
        let m = (month - 1) as usize;
        let nt = data.shape()[0];
        for (i, &lat) in window.lat_indices.iter().enumerate() {
            for (j, &lon) in window.lon_indices.iter().enumerate() {
                let mean = self.mean[[m, lat, lon]];
                let std = self.std[[m, lat, lon]];
                for t in 0..nt {
                    data[[t, i, j]] = (data[[t, i, j]] - mean) / std;
                }
            }
        }
    }
}

/// Creates one [`Normalizer`] per (field, level) pair.
///
/// `shape` is the `(time, lat, lon)` extent of the full data array, for
/// implementations that validate their statistics against the grid.
pub trait NormalizerFactory {
    fn create(
        &self,
        field: &FieldConfig,
        level: i64,
        shape: (usize, usize, usize),
    ) -> Result<Box<dyn Normalizer>>;
}

/// Statistics registered for one (field, level) pair.
#[derive(Debug, Clone)]
pub enum FieldStats {
    Global(MonthlyStats),
    Local { mean: Array3<f32>, std: Array3<f32> },
}

/// A [`NormalizerFactory`] backed by pre-registered statistics.
///
/// Construction fails fast for a (field, level) pair with no statistics or
/// whose statistics kind does not match the field's configured
/// normalization kind.
#[derive(Debug, Clone, Default)]
pub struct StatsBank {
    stats: HashMap<(String, i64), FieldStats>,
}

impl StatsBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register global statistics for a (field, level) pair.
    pub fn insert_global(&mut self, field: impl Into<String>, level: i64, stats: MonthlyStats) {
        self.stats
            .insert((field.into(), level), FieldStats::Global(stats));
    }

    /// Register local statistics for a (field, level) pair.
    pub fn insert_local(
        &mut self,
        field: impl Into<String>,
        level: i64,
        mean: Array3<f32>,
        std: Array3<f32>,
    ) {
        self.stats
            .insert((field.into(), level), FieldStats::Local { mean, std });
    }

    /// A bank with identity global statistics for every listed (field,
    /// level) pair; normalization becomes a no-op.
    pub fn identity(fields: &[FieldConfig], levels: &[i64]) -> Self {
        let mut bank = Self::new();
        for field in fields {
            for &level in levels {
                bank.insert_global(field.name.clone(), level, MonthlyStats::identity());
            }
        }
        bank
    }
}

impl NormalizerFactory for StatsBank {
    fn create(
        &self,
        field: &FieldConfig,
        level: i64,
        shape: (usize, usize, usize),
    ) -> Result<Box<dyn Normalizer>> {
        let entry = self
            .stats
            .get(&(field.name.clone(), level))
            .ok_or_else(|| SamplerError::MissingStatistics {
                field: field.name.clone(),
                level,
            })?;

        match (field.normalization, entry) {
            (NormalizationKind::Global, FieldStats::Global(stats)) => {
                Ok(Box::new(GlobalNormalizer::new(stats.clone())))
            }
            (NormalizationKind::Local, FieldStats::Local { mean, std }) => {
                let (_, nlat, nlon) = shape;
                if mean.dim().1 != nlat || mean.dim().2 != nlon {
                    return Err(SamplerError::shape(format!(
                        "local stats for '{}' level {} cover {:?} cells, grid is {}x{}",
                        field.name,
                        level,
                        (mean.dim().1, mean.dim().2),
                        nlat,
                        nlon
                    )));
                }
                Ok(Box::new(LocalNormalizer::new(mean.clone(), std.clone())?))
            }
            _ => Err(SamplerError::config(format!(
                "statistics kind for '{}' level {} does not match its normalization kind",
                field.name, level
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_global_normalizer_zscore() {
        let norm = GlobalNormalizer::new(MonthlyStats::constant(10.0, 2.0));
        let mut data = Array3::from_elem((2, 3, 3), 14.0f32);
        let window = SpatialWindow {
            lat_indices: &[0, 1, 2],
            lon_indices: &[0, 1, 2],
        };
        norm.normalize(2021, 6, data.view_mut(), &window);
        assert!(data.iter().all(|&v| (v - 2.0).abs() < 1e-6));
    }

    #[test]
    fn test_global_normalizer_uses_month_statistics() {
        let mut stats = MonthlyStats::constant(0.0, 1.0);
        stats.mean[0] = 5.0; // January
        let norm = GlobalNormalizer::new(stats);
        let mut data = Array3::from_elem((1, 1, 1), 5.0f32);
        let window = SpatialWindow {
            lat_indices: &[0],
            lon_indices: &[0],
        };
        norm.normalize(2021, 1, data.view_mut(), &window);
        assert!((data[[0, 0, 0]] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_local_normalizer_indexes_through_window() {
        // Grid 4x4; stats mean equals 100 * lat index so each selected row
        // must pick up its own offset.
        let mut mean = Array3::zeros((12, 4, 4));
        for m in 0..12 {
            for i in 0..4 {
                for j in 0..4 {
                    mean[[m, i, j]] = (i * 100) as f32;
                }
            }
        }
        let std = Array3::from_elem((12, 4, 4), 1.0f32);
        let norm = LocalNormalizer::new(mean, std).unwrap();

        let mut data = Array3::zeros((1, 2, 2));
        data[[0, 0, 0]] = 200.0;
        data[[0, 0, 1]] = 200.0;
        data[[0, 1, 0]] = 300.0;
        data[[0, 1, 1]] = 300.0;
        let window = SpatialWindow {
            lat_indices: &[2, 3],
            lon_indices: &[1, 2],
        };
        norm.normalize(2021, 7, data.view_mut(), &window);
        assert!(data.iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_local_normalizer_rejects_mismatched_shapes() {
        let mean = Array3::zeros((12, 4, 4));
        let std = Array3::zeros((12, 3, 4));
        assert!(LocalNormalizer::new(mean, std).is_err());

        let mean = Array3::zeros((6, 4, 4));
        let std = Array3::zeros((6, 4, 4));
        assert!(LocalNormalizer::new(mean, std).is_err());
    }

    #[test]
    fn test_stats_bank_missing_entry() {
        let bank = StatsBank::new();
        let field = FieldConfig::new("temperature");
        let err = bank.create(&field, 137, (10, 4, 4)).unwrap_err();
        assert!(matches!(err, SamplerError::MissingStatistics { .. }));
    }

    #[test]
    fn test_stats_bank_kind_mismatch() {
        let mut bank = StatsBank::new();
        bank.insert_global("temperature", 137, MonthlyStats::identity());
        let field = FieldConfig::local("temperature");
        let err = bank.create(&field, 137, (10, 4, 4)).unwrap_err();
        assert!(matches!(err, SamplerError::Config(_)));
    }

    #[test]
    fn test_stats_bank_local_grid_mismatch() {
        let mut bank = StatsBank::new();
        bank.insert_local(
            "temperature",
            137,
            Array3::zeros((12, 8, 8)),
            Array3::from_elem((12, 8, 8), 1.0),
        );
        let field = FieldConfig::local("temperature");
        let err = bank.create(&field, 137, (10, 4, 4)).unwrap_err();
        assert!(matches!(err, SamplerError::Shape(_)));
    }
}
