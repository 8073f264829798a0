//! Data error types

use std::path::PathBuf;
use thiserror::Error;

/// Dataset loading and preprocessing errors
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse { path: PathBuf, line: usize, message: String },

    /// Sequence longer than `max_length` with truncation disabled
    #[error("Sequence of {len} tokens exceeds max_length {max_length} and truncation is disabled")]
    SequenceTooLong { len: usize, max_length: usize },

    #[error("Selection end {end} is out of range for dataset of {len} examples")]
    SelectOutOfRange { end: usize, len: usize },

    #[error("Invalid tokenizer options: {0}")]
    InvalidOptions(String),

    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,
}
