//! Intermediate checkpoints
//!
//! Creates `{output_dir}/checkpoint-{step}/` holding the model files plus
//! `trainer_state.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{ModelError, SequenceClassifier};

use super::error::OptimizationError;

/// File written next to the model weights of every checkpoint
pub const TRAINER_STATE_FILE: &str = "trainer_state.json";

/// Loop position stored with a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerState {
    pub global_step: usize,
    pub epoch: usize,
    pub learning_rate: f32,
    pub loss_history: Vec<f32>,
}

impl TrainerState {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = dir.as_ref().join(TRAINER_STATE_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| ModelError::Io { path: path.clone(), source })?;
        serde_json::from_str(&text).map_err(|e| ModelError::ConfigParse { path, message: e.to_string() })
    }
}

/// Directory name used for the checkpoint taken after `step` updates
pub fn checkpoint_dir(output_dir: impl AsRef<Path>, step: usize) -> PathBuf {
    output_dir.as_ref().join(format!("checkpoint-{step}"))
}

/// Save `model` and `state` under `output_dir/checkpoint-{state.global_step}`.
pub fn save_checkpoint(
    model: &SequenceClassifier,
    output_dir: impl AsRef<Path>,
    state: &TrainerState,
) -> Result<PathBuf, OptimizationError> {
    let dir = checkpoint_dir(output_dir, state.global_step);
    write_checkpoint(model, &dir, state).map_err(|source| OptimizationError::Checkpoint { path: dir.clone(), source })?;
    Ok(dir)
}

fn write_checkpoint(model: &SequenceClassifier, dir: &Path, state: &TrainerState) -> Result<(), ModelError> {
    model.save_pretrained(dir)?;
    let path = dir.join(TRAINER_STATE_FILE);
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| ModelError::ConfigParse { path: path.clone(), message: e.to_string() })?;
    std::fs::write(&path, json).map_err(|source| ModelError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;

    fn state(step: usize) -> TrainerState {
        TrainerState { global_step: step, epoch: 1, learning_rate: 1e-3, loss_history: vec![0.7, 0.6] }
    }

    #[test]
    fn test_checkpoint_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let model = SequenceClassifier::new(ModelConfig::default().with_vocab_size(32), 0).unwrap();

        let dir = save_checkpoint(&model, tmp.path(), &state(4)).unwrap();
        assert_eq!(dir, tmp.path().join("checkpoint-4"));
        assert_eq!(TrainerState::load(&dir).unwrap(), state(4));

        let reloaded = SequenceClassifier::from_pretrained(&dir).unwrap();
        assert_eq!(reloaded.classifier().linear().weight, model.classifier().linear().weight);
    }

    #[test]
    fn test_unwritable_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let model = SequenceClassifier::new(ModelConfig::default().with_vocab_size(32), 0).unwrap();

        let err = save_checkpoint(&model, &blocker, &state(1)).unwrap_err();
        assert!(matches!(err, OptimizationError::Checkpoint { .. }));
    }
}
