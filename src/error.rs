//! Crate-wide error type
//!
//! Each subsystem owns a focused error enum; `Error` aggregates them so the
//! public entry points can return a single `Result`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::DataError;
use crate::model::ModelError;
use crate::orchestrate::OptimizationError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Optimization configs are invalid or mutually incompatible
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The combined training run failed
    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    /// Model loading, saving or shape handling failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Dataset loading or preprocessing failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// Run spec could not be read or parsed
    #[error("Failed to load run spec {path}: {message}")]
    Spec { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure is a configuration problem the caller must fix
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// True when the training run itself failed
    pub fn is_optimization(&self) -> bool {
        matches!(self, Error::Optimization(_))
    }
}
