//! Bookkeeping carried across steps of one run

use std::path::PathBuf;
use std::time::Instant;

use crate::eval::EvalReport;
use crate::model::SequenceClassifier;
use crate::orchestrate::{OptimizationError, TrainerState};
use crate::train::callback::CallbackContext;

use super::step::StepLoss;

/// Mutable loop state; one per `optimize` call
#[derive(Debug)]
pub(crate) struct LoopState {
    pub max_epochs: usize,
    pub steps_per_epoch: usize,
    pub total_steps: usize,
    pub global_step: usize,
    pub epochs_completed: usize,
    pub stopped_early: bool,
    pub loss_history: Vec<f32>,
    pub last: StepLoss,
    pub best_loss: Option<f32>,
    pub eval: Option<EvalReport>,
    pub checkpoints: Vec<PathBuf>,
    first_loss: Option<f32>,
    start: Instant,
}

impl LoopState {
    pub fn new(max_epochs: usize, steps_per_epoch: usize, total_steps: usize) -> Self {
        Self {
            max_epochs,
            steps_per_epoch,
            total_steps,
            global_step: 0,
            epochs_completed: 0,
            stopped_early: false,
            loss_history: Vec::with_capacity(total_steps),
            last: StepLoss::default(),
            best_loss: None,
            eval: None,
            checkpoints: Vec::new(),
            first_loss: None,
            start: Instant::now(),
        }
    }

    /// Fail when `loss` is non-finite or has grown past `factor` times the
    /// first step's loss.
    pub fn check_divergence(&self, loss: f32, factor: f32) -> Result<(), OptimizationError> {
        let exploded = self.first_loss.is_some_and(|first| loss > factor * first.max(1e-3));
        if !loss.is_finite() || exploded {
            return Err(OptimizationError::Diverged { step: self.global_step, loss });
        }
        Ok(())
    }

    pub fn record(&mut self, loss: StepLoss) {
        self.first_loss.get_or_insert(loss.total);
        self.loss_history.push(loss.total);
        self.last = loss;
        self.global_step += 1;
    }

    pub fn finish_epoch(&mut self, epoch_loss: f32) {
        self.epochs_completed += 1;
        if self.best_loss.is_none_or(|best| epoch_loss < best) {
            self.best_loss = Some(epoch_loss);
        }
    }

    pub fn trainer_state(&self, epoch: usize, lr: f32) -> TrainerState {
        TrainerState {
            global_step: self.global_step,
            epoch,
            learning_rate: lr,
            loss_history: self.loss_history.clone(),
        }
    }

    pub fn context(&self, epoch: usize, step: usize, lr: f32, model: &SequenceClassifier) -> CallbackContext {
        CallbackContext {
            epoch,
            max_epochs: self.max_epochs,
            step,
            steps_per_epoch: self.steps_per_epoch,
            global_step: self.global_step,
            total_steps: self.total_steps,
            loss: self.last.total,
            task_loss: self.last.task,
            distill_loss: self.last.distill,
            lr,
            sparsity: masked_sparsity(model),
            best_loss: self.best_loss,
            eval_loss: self.eval.map(|e| e.eval_loss),
            eval_accuracy: self.eval.map(|e| e.eval_accuracy),
            elapsed_secs: self.start.elapsed().as_secs_f64(),
        }
    }
}

/// Mean sparsity over layers that carry a pruning mask
fn masked_sparsity(model: &SequenceClassifier) -> f32 {
    let masked: Vec<f32> = model
        .layer_names()
        .iter()
        .filter_map(|name| model.layer(name))
        .filter(|layer| layer.linear().mask().is_some())
        .map(|layer| layer.linear().sparsity())
        .collect();
    if masked.is_empty() {
        0.0
    } else {
        masked.iter().sum::<f32>() / masked.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loss(total: f32) -> StepLoss {
        StepLoss { total, task: total, distill: None }
    }

    #[test]
    fn test_divergence_against_first_loss() {
        let mut state = LoopState::new(1, 4, 4);
        assert!(state.check_divergence(5.0, 10.0).is_ok());
        state.record(loss(0.5));
        assert!(state.check_divergence(4.9, 10.0).is_ok());
        let err = state.check_divergence(5.1, 10.0).unwrap_err();
        assert!(matches!(err, OptimizationError::Diverged { step: 1, .. }));
    }

    #[test]
    fn test_non_finite_loss_diverges() {
        let state = LoopState::new(1, 4, 4);
        assert!(state.check_divergence(f32::NAN, 10.0).is_err());
        assert!(state.check_divergence(f32::INFINITY, 10.0).is_err());
    }

    #[test]
    fn test_best_loss_tracks_minimum() {
        let mut state = LoopState::new(3, 1, 3);
        state.finish_epoch(0.8);
        state.finish_epoch(0.9);
        state.finish_epoch(0.4);
        assert_eq!(state.best_loss, Some(0.4));
        assert_eq!(state.epochs_completed, 3);
    }
}
