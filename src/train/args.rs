//! Training arguments for the combined optimization loop

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::optim::LrSchedulerType;

/// Hyperparameters and output locations for one orchestrated run.
///
/// # Example
///
/// ```
/// use orquestar::train::TrainingArgs;
///
/// let args = TrainingArgs::default().with_epochs(1).with_batch_size(4);
/// assert_eq!(args.output_dir.to_str(), Some("tmp_trainer"));
/// assert!(args.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingArgs {
    /// Passes over the training set
    pub epochs: usize,

    /// Examples per step
    pub batch_size: usize,

    /// Peak learning rate
    pub learning_rate: f32,

    /// Decoupled AdamW weight decay
    pub weight_decay: f32,

    /// Linear warmup steps before the decay phase
    pub warmup_steps: usize,

    /// Learning-rate schedule
    pub lr_scheduler_type: LrSchedulerType,

    /// Global gradient norm clip; `None` disables clipping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_grad_norm: Option<f32>,

    /// Checkpoints land under `output_dir/checkpoint-<step>`
    pub output_dir: PathBuf,

    /// Checkpoint interval in steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_steps: Option<usize>,

    /// Where the optimized model is saved once the run succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_model_dir: Option<PathBuf>,

    /// Abort when the loss exceeds this multiple of the first step's loss
    pub divergence_factor: f32,

    /// Allowed gap between achieved and target sparsity
    pub sparsity_tolerance: f32,

    /// Steps between progress log lines
    pub logging_steps: usize,
}

impl Default for TrainingArgs {
    fn default() -> Self {
        Self {
            epochs: 3,
            batch_size: 8,
            learning_rate: 5e-5,
            weight_decay: 0.0,
            warmup_steps: 0,
            lr_scheduler_type: LrSchedulerType::Linear,
            max_grad_norm: Some(1.0),
            output_dir: PathBuf::from("tmp_trainer"),
            save_steps: None,
            final_model_dir: None,
            divergence_factor: 10.0,
            sparsity_tolerance: 0.02,
            logging_steps: 10,
        }
    }
}

impl TrainingArgs {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_warmup_steps(mut self, steps: usize) -> Self {
        self.warmup_steps = steps;
        self
    }

    pub fn with_lr_scheduler_type(mut self, kind: LrSchedulerType) -> Self {
        self.lr_scheduler_type = kind;
        self
    }

    pub fn with_max_grad_norm(mut self, max_norm: Option<f32>) -> Self {
        self.max_grad_norm = max_norm;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_save_steps(mut self, steps: usize) -> Self {
        self.save_steps = Some(steps);
        self
    }

    pub fn with_final_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.final_model_dir = Some(dir.into());
        self
    }

    pub fn with_divergence_factor(mut self, factor: f32) -> Self {
        self.divergence_factor = factor;
        self
    }

    pub fn with_sparsity_tolerance(mut self, tolerance: f32) -> Self {
        self.sparsity_tolerance = tolerance;
        self
    }

    pub fn with_logging_steps(mut self, steps: usize) -> Self {
        self.logging_steps = steps;
        self
    }

    /// Optimizer steps for a training set of `num_examples`
    pub fn total_steps(&self, num_examples: usize) -> usize {
        self.steps_per_epoch(num_examples) * self.epochs
    }

    pub fn steps_per_epoch(&self, num_examples: usize) -> usize {
        num_examples.div_ceil(self.batch_size.max(1))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be > 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(format!("learning_rate must be positive (got {})", self.learning_rate));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(format!("weight_decay must be >= 0 (got {})", self.weight_decay));
        }
        if let Some(norm) = self.max_grad_norm {
            if !(norm.is_finite() && norm > 0.0) {
                return Err(format!("max_grad_norm must be positive (got {norm})"));
            }
        }
        if self.save_steps == Some(0) {
            return Err("save_steps must be > 0".to_string());
        }
        if !(self.divergence_factor.is_finite() && self.divergence_factor > 1.0) {
            return Err(format!("divergence_factor must be > 1 (got {})", self.divergence_factor));
        }
        if !(0.0..1.0).contains(&self.sparsity_tolerance) {
            return Err(format!(
                "sparsity_tolerance must be in [0, 1) (got {})",
                self.sparsity_tolerance
            ));
        }
        Ok(())
    }
}
