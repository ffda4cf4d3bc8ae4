use std::path::PathBuf;

/// Errors raised when caller-supplied flat data cannot be reshaped into
/// `[rows, dim]` form.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("{name} data has {len} elements, which does not divide into rows of {dim}")]
    NotDivisible {
        name: &'static str,
        len: usize,
        dim: usize,
    },

    #[error("{name} data has {rows} rows but {expected} were expected")]
    RowMismatch {
        name: &'static str,
        rows: usize,
        expected: usize,
    },
}

/// Errors that abort network construction.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{field} must be positive")]
    ZeroDim { field: &'static str },

    #[error("hidden layer {index} has width 0")]
    ZeroWidth { index: usize },

    #[error("batch_size must be > 0")]
    ZeroBatchSize,

    #[error("learning_rate must be > 0, got {0}")]
    InvalidLearningRate(f64),
}

/// Errors that can occur during training. Never retried here; the caller
/// decides what to do with a failed run.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("no training samples provided")]
    NoSamples,

    #[error("non-finite loss {loss} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss {
        epoch: usize,
        batch: usize,
        loss: f32,
    },
}

/// Errors that can occur while saving or loading a checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("failed to save network weights: {0}")]
    WeightsSave(String),

    #[error("failed to load network weights: {0}")]
    WeightsLoad(String),

    #[error("failed to read network config from {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse network config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("stored config is invalid: {0}")]
    InvalidConfig(#[from] BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading the training binary's configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
