//! Core traits and types for the callback system
//!
//! - `CallbackContext` - State passed to callbacks
//! - `CallbackAction` - Actions a callback can request
//! - `TrainerCallback` - The trait all callbacks implement

/// Context passed to callbacks with current training state
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current step within epoch
    pub step: usize,
    /// Total steps in epoch
    pub steps_per_epoch: usize,
    /// Global step count
    pub global_step: usize,
    /// Total optimizer steps planned for the run
    pub total_steps: usize,
    /// Combined loss of the last step
    pub loss: f32,
    /// Student-vs-label term of the last step
    pub task_loss: f32,
    /// Student-vs-teacher term, when distilling
    pub distill_loss: Option<f32>,
    /// Current learning rate
    pub lr: f32,
    /// Mean sparsity of pruned layers
    pub sparsity: f32,
    /// Best epoch loss seen so far
    pub best_loss: Option<f32>,
    /// Evaluation loss (if available)
    pub eval_loss: Option<f32>,
    /// Evaluation accuracy (if available)
    pub eval_accuracy: Option<f32>,
    /// Training duration in seconds
    pub elapsed_secs: f64,
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training after the current step
    Stop,
    /// Skip rest of current epoch
    SkipEpoch,
}

/// Trait for training callbacks
///
/// Implement this trait to hook into training events. All methods have
/// default no-op implementations, so you only need to implement the
/// events you care about.
pub trait TrainerCallback: Send {
    /// Called before training starts
    fn on_train_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after training ends
    fn on_train_end(&mut self, _ctx: &CallbackContext) {}

    /// Called before each epoch
    fn on_epoch_begin(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each epoch
    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called after each optimizer step
    fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Called when the eval set has been scored
    fn on_evaluate(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}
