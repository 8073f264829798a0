//! Learning rate schedulers

use serde::{Deserialize, Serialize};

use super::Optimizer;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (called once per optimizer step)
    fn step(&mut self);

    /// Apply the current learning rate to an optimizer
    fn apply<O: Optimizer + ?Sized>(&self, optimizer: &mut O)
    where
        Self: Sized,
    {
        optimizer.set_lr(self.get_lr());
    }
}

/// Fixed learning rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantLR {
    lr: f32,
}

impl ConstantLR {
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }
}

impl LRScheduler for ConstantLR {
    fn get_lr(&self) -> f32 {
        self.lr
    }

    fn step(&mut self) {}
}

/// Linear warmup followed by linear decay to zero.
///
/// lr_t = lr_max * t / warmup                        for t < warmup
/// lr_t = lr_max * (T - t) / (T - warmup)             afterwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearDecayLR {
    lr_max: f32,
    warmup_steps: usize,
    total_steps: usize,
    current_step: usize,
}

impl LinearDecayLR {
    pub fn new(lr_max: f32, warmup_steps: usize, total_steps: usize) -> Self {
        Self { lr_max, warmup_steps, total_steps: total_steps.max(1), current_step: 0 }
    }
}

impl LRScheduler for LinearDecayLR {
    fn get_lr(&self) -> f32 {
        let t = self.current_step;
        if t < self.warmup_steps {
            return self.lr_max * (t + 1) as f32 / self.warmup_steps as f32;
        }
        let remaining = self.total_steps.saturating_sub(t) as f32;
        let span = self.total_steps.saturating_sub(self.warmup_steps).max(1) as f32;
        self.lr_max * remaining / span
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}

/// Scheduler selection for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrSchedulerType {
    /// Warmup then linear decay to zero
    #[default]
    Linear,
    /// Fixed learning rate; warmup is ignored
    Constant,
}

impl LrSchedulerType {
    pub fn build(self, lr: f32, warmup_steps: usize, total_steps: usize) -> Box<dyn LRScheduler> {
        match self {
            LrSchedulerType::Linear => Box::new(LinearDecayLR::new(lr, warmup_steps, total_steps)),
            LrSchedulerType::Constant => Box::new(ConstantLR::new(lr)),
        }
    }
}
