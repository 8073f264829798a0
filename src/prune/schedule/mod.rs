//! Pruning schedule definitions
//!
//! Defines how far along its sparsity target a pruner is at each step:
//! - OneShot: the full target at a single step
//! - Gradual: linear ramp across a step window
//! - Cubic: cubic ramp (Zhu & Gupta, 2017), fast early and slow near the target
//!
//! # References
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune: exploring the
//!   efficacy of pruning for model compression. arXiv:1710.01878.


use serde::{Deserialize, Serialize};

/// Pruning schedule over training steps.
///
/// Schedules produce a *progress* fraction in `[0, 1]`; the sparsity at a
/// step is `target * progress`. The window is inclusive: at `end_step` the
/// full target is reached.
///
/// # Example
///
/// ```
/// use orquestar::prune::PruningSchedule;
///
/// let cubic = PruningSchedule::Cubic { start_step: 0, end_step: 2, frequency: 1 };
/// assert_eq!(cubic.sparsity_at_step(0.64, 0), 0.0);
/// assert!((cubic.sparsity_at_step(0.64, 1) - 0.56).abs() < 1e-6);
/// assert_eq!(cubic.sparsity_at_step(0.64, 2), 0.64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PruningSchedule {
    /// Prune to the full target at `step`.
    OneShot {
        /// Step at which to apply pruning.
        step: usize,
    },

    /// Linear interpolation from zero to the target.
    Gradual {
        /// Step to begin pruning.
        start_step: usize,
        /// Step at which the target is reached.
        end_step: usize,
        /// Prune every N steps.
        frequency: usize,
    },

    /// Cubic sparsity schedule.
    ///
    /// Formula: s_t = s_f * (1 - (1 - t/T)^3)
    Cubic {
        /// Step to begin pruning.
        start_step: usize,
        /// Step at which the target is reached.
        end_step: usize,
        /// Prune every N steps.
        frequency: usize,
    },
}

impl Default for PruningSchedule {
    fn default() -> Self {
        PruningSchedule::OneShot { step: 0 }
    }
}

impl PruningSchedule {
    /// Step at which pruning begins.
    pub fn start_step(&self) -> usize {
        match *self {
            PruningSchedule::OneShot { step } => step,
            PruningSchedule::Gradual { start_step, .. } | PruningSchedule::Cubic { start_step, .. } => {
                start_step
            }
        }
    }

    /// Step at which the full target is reached.
    pub fn end_step(&self) -> usize {
        match *self {
            PruningSchedule::OneShot { step } => step,
            PruningSchedule::Gradual { end_step, .. } | PruningSchedule::Cubic { end_step, .. } => end_step,
        }
    }

    /// Fraction of the target reached at `step`, in `[0, 1]`.
    pub fn progress_at_step(&self, step: usize) -> f32 {
        let (start, end) = (self.start_step(), self.end_step());
        if step < start {
            return 0.0;
        }
        if step >= end {
            return 1.0;
        }
        let t = (step - start) as f32 / (end - start) as f32;
        match self {
            PruningSchedule::OneShot { .. } => 1.0,
            PruningSchedule::Gradual { .. } => t,
            PruningSchedule::Cubic { .. } => 1.0 - (1.0 - t).powi(3),
        }
    }

    /// Target sparsity at `step` for a final target of `target`.
    pub fn sparsity_at_step(&self, target: f32, step: usize) -> f32 {
        target * self.progress_at_step(step)
    }

    /// Whether masks should be recomputed at `step`.
    ///
    /// Inside the window pruning happens every `frequency` steps counted from
    /// `start_step`; the final step of the window always prunes so the target
    /// is reached regardless of frequency.
    pub fn should_prune_at_step(&self, step: usize) -> bool {
        match *self {
            PruningSchedule::OneShot { step: prune_step } => step == prune_step,
            PruningSchedule::Gradual { start_step, end_step, frequency }
            | PruningSchedule::Cubic { start_step, end_step, frequency } => {
                if step < start_step || step > end_step {
                    return false;
                }
                if step == end_step || frequency == 0 {
                    return step == end_step || step == start_step;
                }
                (step - start_step).is_multiple_of(frequency)
            }
        }
    }

    /// Number of steps at which masks are recomputed.
    pub fn num_pruning_steps(&self) -> usize {
        (self.start_step()..=self.end_step()).filter(|&s| self.should_prune_at_step(s)).count()
    }

    /// Check if the schedule is valid.
    ///
    /// # Errors
    ///
    /// Returns an error message if the schedule is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.end_step() < self.start_step() {
            return Err(format!(
                "end_step ({}) must not be before start_step ({})",
                self.end_step(),
                self.start_step()
            ));
        }
        Ok(())
    }

    /// Check if pruning has completed (current step is past the schedule).
    pub fn is_complete(&self, step: usize) -> bool {
        step > self.end_step()
    }
}
