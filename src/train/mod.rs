//! Training primitives for the combined optimization loop
//!
//! - Classification losses with analytic gradients
//! - Training arguments
//! - Callback system

mod args;
pub mod callback;
pub mod loss;

pub use args::TrainingArgs;
pub use callback::{CallbackAction, CallbackContext, CallbackManager, ProgressCallback, TrainerCallback};
pub use loss::{cross_entropy, one_hot, softmax_2d, softmax_backward};
