//! Configuration registry errors

use thiserror::Error;

use super::optimization::Technique;

/// Raised when optimization configs are invalid or mutually incompatible.
///
/// The caller must fix the configuration; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No optimization configs given")]
    EmptyConfigList,

    #[error("More than one {0} config given")]
    DuplicateTechnique(Technique),

    #[error("Layer {layer} is targeted by more than one pruner")]
    LayerConflict { layer: String },

    #[error("{technique} targets unknown layer {layer}")]
    UnknownLayer { technique: Technique, layer: String },

    #[error("Distillation requires a teacher model")]
    MissingTeacher,

    #[error("Teacher predicts {teacher} labels but the student predicts {student}")]
    LabelSpaceMismatch { student: usize, teacher: usize },

    #[error("{split} split has label {label} but the student predicts {num_labels} labels")]
    LabelOutOfRange { split: String, label: usize, num_labels: usize },

    #[error("Quantization requires calibration data but none was supplied")]
    MissingCalibrationSource,

    #[error("Pruning schedule ends at step {last_step} but training runs {total_steps} steps")]
    ScheduleExceedsTraining { last_step: usize, total_steps: usize },

    #[error("Invalid {technique} config: {message}")]
    Invalid { technique: Technique, message: String },

    #[error("Invalid training arguments: {0}")]
    InvalidArgs(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),
}
