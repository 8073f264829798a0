//! Knowledge Distillation
//!
//! Trains the student against a fixed teacher's soft targets in addition to
//! the ground-truth labels. The teacher runs in inference mode only.

mod config;
mod distiller;
mod loss;

pub use config::{DistillationConfig, DistillationLossKind, KnowledgeDistillationLossConfig};
pub use distiller::Distiller;
pub use loss::{DistillationLoss, DistillationOutput};
