//! Run-time failures of the combined training loop

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Technique;
use crate::data::DataError;
use crate::model::ModelError;

/// Raised when a run is aborted. No partial model is returned.
#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error("Training dataset is empty")]
    EmptyDataset,

    #[error("Loss diverged at step {step}: {loss}")]
    Diverged { step: usize, loss: f32 },

    #[error("Quantization requires calibration data but the calibration source yielded no batches")]
    MissingCalibrationData,

    #[error("Layer {layer} reached sparsity {achieved:.4}, target {target:.4} (tolerance {tolerance})")]
    SparsityNotReached { layer: String, achieved: f32, target: f32, tolerance: f32 },

    #[error("{technique} was requested but not applied: {reason}")]
    TechniqueNotApplied { technique: Technique, reason: String },

    #[error("Pruning failed: {0}")]
    Pruning(String),

    #[error("Distillation failed: {0}")]
    Distillation(String),

    #[error("Failed to write checkpoint {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
