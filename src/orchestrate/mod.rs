//! Combined compression orchestration
//!
//! - [`Orchestrator`]: runs pruning, distillation and quantization-aware
//!   training on one student inside a single loop
//! - [`CompressionCallback`]: the hooks each technique implements
//! - [`TrainingContext`] / [`RunEnvironment`]: run inputs
//! - [`OptimizedModel`] / [`OptimizationReport`]: run results

mod checkpoint;
mod context;
mod error;
mod orchestrator;
mod pass;
mod report;

pub use checkpoint::{checkpoint_dir, save_checkpoint, TrainerState, TRAINER_STATE_FILE};
pub use context::{RunEnvironment, TrainingContext};
pub use error::OptimizationError;
pub use orchestrator::Orchestrator;
pub use pass::{CompressionCallback, PassContext, StepInfo};
pub use report::{AppliedTechnique, OptimizationReport, OptimizedModel, REPORT_FILE};
