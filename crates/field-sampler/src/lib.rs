//! Windowed sampling over gridded multi-field geophysical time series.
//!
//! The crate turns a chunked `(time, field, level, lat, lon)` dataset into a
//! stream of normalized training batches. An epoch proceeds in stages:
//!
//! 1. [`store::DataStore`] exposes the dataset and its coordinate axes.
//! 2. [`catalog::FieldCatalog`] resolves the configured fields and vertical
//!    levels against the dataset and attaches a normalizer per pair.
//! 3. [`plan::EpochPlan`] draws the epoch's time block centers and spatial
//!    sample centers from a seeded generator.
//! 4. [`partition::worker_range`] assigns each worker a disjoint slice of
//!    the plan's batches.
//! 5. [`sampler::EpochIter`] reads one time block per batch, cuts the
//!    spatial neighborhoods, normalizes them and hands the stacked tensor
//!    to a [`sampler::BatchAssembler`].
//!
//! Identically seeded samplers produce identical epochs, which is what lets
//! independent workers agree on a plan without communicating.

pub mod catalog;
pub mod config;
pub mod error;
pub mod normalize;
pub mod partition;
pub mod plan;
pub mod sampler;
pub mod store;
pub mod testdata;
pub mod types;

pub use catalog::FieldCatalog;
pub use config::{FieldConfig, Neighborhood, NormalizationKind, SamplerConfig};
pub use error::{Result, SamplerError};
pub use normalize::{Normalizer, NormalizerFactory, StatsBank};
pub use partition::{worker_range, WorkerSplit};
pub use sampler::{BatchAssembler, EpochIter, MultifieldSampler, RawBatchAssembler};
pub use store::{DataStore, MemoryStore, ZarrDataStore};
pub use types::{SampleBatch, SourceIndices, SourceInfo};
