//! Hooks through which compression techniques act on the student

use crate::config::Technique;
use crate::data::Batch;
use crate::model::{Gradients, SequenceClassifier};

use super::error::OptimizationError;
use super::report::AppliedTechnique;

/// Position of the loop when a step hook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInfo {
    pub epoch: usize,
    /// Optimizer steps taken before this one
    pub global_step: usize,
    pub total_steps: usize,
}

/// Data available to passes before the first step
#[derive(Debug, Clone, Copy, Default)]
pub struct PassContext<'a> {
    /// Calibration batches, already collated
    pub calibration: &'a [Batch],
    pub total_steps: usize,
}

/// A compression technique that reshapes the student during training.
///
/// Unlike [`crate::train::TrainerCallback`], these hooks get the model
/// itself and can fail the run. Every pass must be able to prove it was
/// applied through [`CompressionCallback::verify`].
pub trait CompressionCallback {
    fn technique(&self) -> Technique;

    /// Called once before the first step
    fn on_train_begin(
        &mut self,
        _model: &mut SequenceClassifier,
        _ctx: &PassContext<'_>,
    ) -> Result<(), OptimizationError> {
        Ok(())
    }

    /// Called before the forward pass of each step
    fn on_step_begin(&mut self, _model: &mut SequenceClassifier, _step: &StepInfo) -> Result<(), OptimizationError> {
        Ok(())
    }

    /// Called with the raw gradients of each step, before clipping
    fn on_gradients(&mut self, _model: &SequenceClassifier, _grads: &Gradients) {}

    /// Called after the optimizer update of each step
    fn on_step_end(&mut self, _model: &mut SequenceClassifier, _step: &StepInfo) -> Result<(), OptimizationError> {
        Ok(())
    }

    /// Called once after the last step
    fn on_train_end(&mut self, _model: &mut SequenceClassifier, _step: &StepInfo) -> Result<(), OptimizationError> {
        Ok(())
    }

    /// Check that the final model carries this technique's structure
    fn verify(&self, model: &SequenceClassifier, tolerance: f32) -> Result<AppliedTechnique, OptimizationError>;

    fn name(&self) -> &'static str {
        "CompressionCallback"
    }
}
