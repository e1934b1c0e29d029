//! Configuration for the sampling engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SamplerError};

/// How a field's values are rescaled before batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationKind {
    /// One (mean, std) pair per calendar month for the whole domain.
    #[default]
    Global,
    /// Per-grid-cell (mean, std) pairs per calendar month.
    Local,
}

/// One requested field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field name as recorded in the dataset catalog.
    pub name: String,
    /// Normalization kind (default: global).
    #[serde(default)]
    pub normalization: NormalizationKind,
}

impl FieldConfig {
    /// Create a field request with global normalization.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalization: NormalizationKind::Global,
        }
    }

    /// Create a field request with local (per-cell) normalization.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalization: NormalizationKind::Local,
        }
    }
}

/// Neighborhood extent of one sample, in (time steps, degrees, degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// Number of look-back time steps.
    pub time_steps: usize,
    /// Latitude extent in degrees.
    pub lat_degrees: f64,
    /// Longitude extent in degrees.
    pub lon_degrees: f64,
}

impl Neighborhood {
    /// Create a neighborhood extent.
    pub fn new(time_steps: usize, lat_degrees: f64, lon_degrees: f64) -> Self {
        Self {
            time_steps,
            lat_degrees,
            lon_degrees,
        }
    }
}

/// Configuration for a [`MultifieldSampler`](crate::MultifieldSampler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Requested fields, in output order.
    pub fields: Vec<FieldConfig>,
    /// Requested vertical levels, in output order.
    pub levels: Vec<i64>,
    /// Years requested for sampling.
    ///
    /// Accepted but not yet applied: the full time range of the dataset is
    /// sampled regardless.
    // TODO restrict the valid time-index range to the listed years.
    #[serde(default)]
    pub years: Vec<i32>,
    /// Samples per emitted batch.
    pub batch_size: usize,
    /// Samples drawn per epoch; `samples_per_epoch / batch_size` batches
    /// are emitted (integer division, leftovers are not drawn).
    pub samples_per_epoch: usize,
    /// Spatiotemporal extent of one sample.
    pub neighborhood: Neighborhood,
    /// Random seed. When absent, a seed is drawn from entropy at
    /// construction and kept for the lifetime of the sampler.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// Stride between consecutive time steps of a window (default 1).
    #[serde(default = "default_time_sampling")]
    pub time_sampling: usize,
    /// Record the exact index sets used for every sample.
    #[serde(default)]
    pub trace_source_indices: bool,
}

fn default_time_sampling() -> usize {
    1
}

impl SamplerConfig {
    /// Create a configuration with default stride, no seed and no tracing.
    pub fn new(
        fields: Vec<FieldConfig>,
        levels: Vec<i64>,
        batch_size: usize,
        samples_per_epoch: usize,
        neighborhood: Neighborhood,
    ) -> Self {
        Self {
            fields,
            levels,
            years: Vec::new(),
            batch_size,
            samples_per_epoch,
            neighborhood,
            rng_seed: None,
            time_sampling: 1,
            trace_source_indices: false,
        }
    }

    /// Apply overrides from environment variables.
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("SAMPLER_BATCH_SIZE") {
            if let Ok(size) = val.parse() {
                self.batch_size = size;
            }
        }

        if let Ok(val) = std::env::var("SAMPLER_SAMPLES_PER_EPOCH") {
            if let Ok(count) = val.parse() {
                self.samples_per_epoch = count;
            }
        }

        if let Ok(val) = std::env::var("SAMPLER_RNG_SEED") {
            if let Ok(seed) = val.parse() {
                self.rng_seed = Some(seed);
            }
        }

        if let Ok(val) = std::env::var("SAMPLER_TRACE_SOURCES") {
            self.trace_source_indices = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SamplerError::config("at least one field is required"));
        }
        if self.levels.is_empty() {
            return Err(SamplerError::config("at least one level is required"));
        }
        if self.batch_size == 0 {
            return Err(SamplerError::config("batch_size must be positive"));
        }
        if self.samples_per_epoch < self.batch_size {
            return Err(SamplerError::config(format!(
                "samples_per_epoch ({}) must be at least batch_size ({})",
                self.samples_per_epoch, self.batch_size
            )));
        }
        if self.neighborhood.time_steps == 0 {
            return Err(SamplerError::config("neighborhood needs at least one time step"));
        }
        if self.neighborhood.lat_degrees <= 0.0 || self.neighborhood.lon_degrees <= 0.0 {
            return Err(SamplerError::config(
                "neighborhood extents must be positive degrees",
            ));
        }
        if self.time_sampling == 0 {
            return Err(SamplerError::config("time_sampling stride must be positive"));
        }
        Ok(())
    }
}
