//! Error types for the sampling engine.

use grid_common::GridError;
use thiserror::Error;

/// Errors that can occur while building or driving a sampler.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// The sampler configuration is internally inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A requested field is absent from the dataset catalog.
    #[error("field not found in dataset catalog: {0}")]
    FieldNotFound(String),

    /// A requested vertical level is absent from the dataset catalog.
    #[error("level not found in dataset catalog: {0}")]
    LevelNotFound(i64),

    /// No normalization statistics registered for a (field, level) pair.
    #[error("normalization statistics missing for field '{field}' level {level}")]
    MissingStatistics { field: String, level: i64 },

    /// Window geometry failure (propagated, never worked around).
    #[error(transparent)]
    Geometry(#[from] GridError),

    /// Failed to open the dataset.
    #[error("failed to open dataset: {0}")]
    OpenFailed(String),

    /// Failed to read data from the dataset.
    #[error("failed to read dataset: {0}")]
    ReadFailed(String),

    /// Invalid or missing dataset metadata.
    #[error("invalid dataset metadata: {0}")]
    InvalidMetadata(String),

    /// Array shapes disagree with the dataset metadata.
    #[error("shape mismatch: {0}")]
    Shape(String),
}

impl SamplerError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a Shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

impl From<ndarray::ShapeError> for SamplerError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Shape(err.to_string())
    }
}

/// Result type for sampler operations.
pub type Result<T> = std::result::Result<T, SamplerError>;
