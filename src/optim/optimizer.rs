//! Optimizer trait

use ndarray::{ArrayViewD, ArrayViewMutD};

/// Parameter update rule.
///
/// Parameters are addressed by a stable slot index so per-parameter state
/// (moment buffers) survives across steps. Call [`Optimizer::begin_step`]
/// once per training step, then [`Optimizer::update`] for every parameter.
pub trait Optimizer {
    /// Advance the step counter
    fn begin_step(&mut self);

    /// Update one parameter in place from its gradient
    fn update(&mut self, slot: usize, param: ArrayViewMutD<'_, f32>, grad: ArrayViewD<'_, f32>);

    /// Current learning rate
    fn lr(&self) -> f32;

    /// Set learning rate (used by schedulers)
    fn set_lr(&mut self, lr: f32);
}
