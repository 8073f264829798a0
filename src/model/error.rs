//! Model error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, loading or saving a model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model directory or identifier not found
    #[error("Model not found: {identifier} (looked in {path})")]
    NotFound { identifier: String, path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// config.json could not be parsed
    #[error("Failed to parse model config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// safetensors payload could not be read or written
    #[error("safetensors error: {0}")]
    SafeTensors(String),

    #[error("Missing tensor in checkpoint: {0}")]
    MissingTensor(String),

    #[error("Tensor shape mismatch for {tensor}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        tensor: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// Model hyperparameters are unusable
    #[error("Invalid model config: {0}")]
    InvalidConfig(String),
}
