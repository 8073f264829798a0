//! Optimizers for training the student model

mod adamw;
mod clip;
mod optimizer;
mod scheduler;

pub use adamw::AdamW;
pub use clip::{clip_grad_norm, global_norm};
pub use optimizer::Optimizer;
pub use scheduler::{ConstantLR, LRScheduler, LinearDecayLR, LrSchedulerType};
