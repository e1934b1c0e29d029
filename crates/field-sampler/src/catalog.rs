//! Resolution of requested fields and levels against the dataset catalog.

use ndarray::{s, Array5};

use crate::config::{NormalizationKind, SamplerConfig};
use crate::error::{Result, SamplerError};
use crate::normalize::{Normalizer, NormalizerFactory, SpatialWindow};

/// One requested field, resolved against storage.
#[derive(Debug)]
pub struct FieldSpec {
    /// Field name as configured.
    pub name: String,
    /// Index of the field along the storage field axis.
    pub storage_index: usize,
    /// Normalization kind the field was configured with.
    pub normalization: NormalizationKind,
    /// One normalizer per requested level, in level order.
    normalizers: Vec<Box<dyn Normalizer>>,
}

/// The resolved (field, level) catalog of a sampler.
///
/// Holds the storage indices of every requested field and level plus one
/// normalizer instance per (field, level) pair. Built once at construction;
/// read-only afterwards.
#[derive(Debug)]
pub struct FieldCatalog {
    specs: Vec<FieldSpec>,
    field_indices: Vec<usize>,
    level_values: Vec<i64>,
    level_indices: Vec<usize>,
}

impl FieldCatalog {
    /// Resolve the configured fields and levels against the storage catalog
    /// and instantiate their normalizers.
    ///
    /// `data_shape` is the `(time, lat, lon)` extent of the data array,
    /// forwarded to the normalizer factory. Fails with `FieldNotFound` /
    /// `LevelNotFound` if anything requested is absent from storage.
    pub fn resolve(
        store_fields: &[String],
        store_levels: &[i64],
        data_shape: (usize, usize, usize),
        config: &SamplerConfig,
        factory: &dyn NormalizerFactory,
    ) -> Result<Self> {
        let level_indices = config
            .levels
            .iter()
            .map(|&level| {
                store_levels
                    .iter()
                    .position(|&l| l == level)
                    .ok_or(SamplerError::LevelNotFound(level))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut specs = Vec::with_capacity(config.fields.len());
        let mut field_indices = Vec::with_capacity(config.fields.len());
        for field in &config.fields {
            let storage_index = store_fields
                .iter()
                .position(|f| f == &field.name)
                .ok_or_else(|| SamplerError::FieldNotFound(field.name.clone()))?;

            let normalizers = config
                .levels
                .iter()
                .map(|&level| factory.create(field, level, data_shape))
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(
                field = %field.name,
                storage_index,
                levels = config.levels.len(),
                "resolved field"
            );
            field_indices.push(storage_index);
            specs.push(FieldSpec {
                name: field.name.clone(),
                storage_index,
                normalization: field.normalization,
                normalizers,
            });
        }

        Ok(Self {
            specs,
            field_indices,
            level_values: config.levels.clone(),
            level_indices,
        })
    }

    /// Storage indices of the requested fields, in output order.
    pub fn field_indices(&self) -> &[usize] {
        &self.field_indices
    }

    /// Storage indices of the requested levels, in output order.
    pub fn level_indices(&self) -> &[usize] {
        &self.level_indices
    }

    /// Requested level identifiers, in output order.
    pub fn level_values(&self) -> &[i64] {
        &self.level_values
    }

    /// Resolved field specs, in output order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Normalize one extracted sample in place, field by field and level by
    /// level.
    ///
    /// `year`/`month` come from the window's last time point; a window that
    /// crosses a month boundary is normalized entirely with that month's
    /// statistics (known approximation).
    pub fn normalize_sample(
        &self,
        year: i32,
        month: u32,
        sample: &mut Array5<f32>,
        window: &SpatialWindow<'_>,
    ) {
        for (fi, spec) in self.specs.iter().enumerate() {
            for (li, normalizer) in spec.normalizers.iter().enumerate() {
                let slice = sample.slice_mut(s![.., fi, li, .., ..]);
                normalizer.normalize(year, month, slice, window);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldConfig, Neighborhood};
    use crate::normalize::{MonthlyStats, StatsBank};
    use ndarray::Array5;

    fn store_catalog() -> (Vec<String>, Vec<i64>) {
        (
            vec![
                "temperature".to_string(),
                "wind_u".to_string(),
                "wind_v".to_string(),
            ],
            vec![96, 114, 123, 137],
        )
    }

    fn config_for(fields: Vec<FieldConfig>, levels: Vec<i64>) -> SamplerConfig {
        SamplerConfig::new(fields, levels, 4, 16, Neighborhood::new(2, 4.0, 4.0))
    }

    #[test]
    fn test_resolve_maps_storage_indices() {
        let (fields, levels) = store_catalog();
        let config = config_for(
            vec![FieldConfig::new("wind_v"), FieldConfig::new("temperature")],
            vec![137, 96],
        );
        let bank = StatsBank::identity(&config.fields, &config.levels);
        let catalog =
            FieldCatalog::resolve(&fields, &levels, (10, 8, 8), &config, &bank).unwrap();

        assert_eq!(catalog.field_indices(), &[2, 0]);
        assert_eq!(catalog.level_indices(), &[3, 0]);
        assert_eq!(catalog.level_values(), &[137, 96]);
    }

    #[test]
    fn test_unknown_field_fails_construction() {
        let (fields, levels) = store_catalog();
        let config = config_for(vec![FieldConfig::new("geopotential")], vec![137]);
        let bank = StatsBank::identity(&config.fields, &config.levels);
        let err = FieldCatalog::resolve(&fields, &levels, (10, 8, 8), &config, &bank).unwrap_err();
        assert!(matches!(err, SamplerError::FieldNotFound(name) if name == "geopotential"));
    }

    #[test]
    fn test_unknown_level_fails_construction() {
        let (fields, levels) = store_catalog();
        let config = config_for(vec![FieldConfig::new("temperature")], vec![500]);
        let bank = StatsBank::identity(&config.fields, &config.levels);
        let err = FieldCatalog::resolve(&fields, &levels, (10, 8, 8), &config, &bank).unwrap_err();
        assert!(matches!(err, SamplerError::LevelNotFound(500)));
    }

    #[test]
    fn test_normalization_is_local_to_field_and_level() {
        let (fields, levels) = store_catalog();
        let config = config_for(
            vec![FieldConfig::new("temperature"), FieldConfig::new("wind_u")],
            vec![96, 137],
        );

        // Shift only temperature@96 by 1000; everything else is identity.
        let mut bank = StatsBank::identity(&config.fields, &config.levels);
        bank.insert_global("temperature", 96, MonthlyStats::constant(1000.0, 1.0));

        let catalog =
            FieldCatalog::resolve(&fields, &levels, (10, 3, 3), &config, &bank).unwrap();

        let mut sample = Array5::from_elem((2, 2, 2, 3, 3), 1000.0f32);
        let window = SpatialWindow {
            lat_indices: &[0, 1, 2],
            lon_indices: &[0, 1, 2],
        };
        catalog.normalize_sample(2021, 3, &mut sample, &window);

        // temperature@96 is slice (.., 0, 0, .., ..) and must be zeroed.
        assert!(sample
            .slice(s![.., 0, 0, .., ..])
            .iter()
            .all(|&v| v.abs() < 1e-6));
        // All other slices are untouched.
        assert!(sample
            .slice(s![.., 0, 1, .., ..])
            .iter()
            .all(|&v| (v - 1000.0).abs() < 1e-6));
        assert!(sample
            .slice(s![.., 1, .., .., ..])
            .iter()
            .all(|&v| (v - 1000.0).abs() < 1e-6));
    }
}
