//! Progress callback for logging training progress

use tracing::{debug, info};

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Logs epoch summaries and periodic step losses through `tracing`
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    /// Log every N global steps
    log_interval: usize,
}

impl ProgressCallback {
    /// Create progress callback
    pub fn new(log_interval: usize) -> Self {
        Self { log_interval: log_interval.max(1) }
    }

    pub fn log_interval(&self) -> usize {
        self.log_interval
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_train_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        info!(
            epochs = ctx.max_epochs,
            steps = ctx.total_steps,
            lr = ctx.lr,
            "training started"
        );
        CallbackAction::Continue
    }

    fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        debug!(epoch = ctx.epoch + 1, of = ctx.max_epochs, lr = ctx.lr, "epoch starting");
        CallbackAction::Continue
    }

    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        info!(
            epoch = ctx.epoch + 1,
            of = ctx.max_epochs,
            loss = ctx.loss,
            sparsity = ctx.sparsity,
            elapsed_secs = ctx.elapsed_secs,
            "epoch finished"
        );
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if ctx.global_step > 0 && ctx.global_step.is_multiple_of(self.log_interval) {
            info!(
                step = ctx.global_step,
                of = ctx.total_steps,
                loss = ctx.loss,
                task_loss = ctx.task_loss,
                distill_loss = ?ctx.distill_loss,
                lr = ctx.lr,
                "step"
            );
        }
        CallbackAction::Continue
    }

    fn on_evaluate(&mut self, ctx: &CallbackContext) -> CallbackAction {
        info!(eval_loss = ?ctx.eval_loss, eval_accuracy = ?ctx.eval_accuracy, "evaluation");
        CallbackAction::Continue
    }

    fn on_train_end(&mut self, ctx: &CallbackContext) {
        info!(
            steps = ctx.global_step,
            loss = ctx.loss,
            elapsed_secs = ctx.elapsed_secs,
            "training finished"
        );
    }

    fn name(&self) -> &'static str {
        "ProgressCallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_callback_never_stops() {
        let mut progress = ProgressCallback::new(5);
        let ctx = CallbackContext {
            max_epochs: 10,
            global_step: 5,
            total_steps: 100,
            loss: 0.5,
            lr: 0.001,
            distill_loss: Some(0.2),
            ..Default::default()
        };

        assert_eq!(progress.on_train_begin(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_epoch_begin(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_step_end(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_evaluate(&ctx), CallbackAction::Continue);
        assert_eq!(progress.on_epoch_end(&ctx), CallbackAction::Continue);
        progress.on_train_end(&ctx);
    }

    #[test]
    fn test_progress_callback_interval() {
        assert_eq!(ProgressCallback::default().log_interval(), 10);
        assert_eq!(ProgressCallback::new(0).log_interval(), 1);
        assert_eq!(ProgressCallback::new(5).name(), "ProgressCallback");
    }
}
