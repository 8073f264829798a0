//! Callback system for training events
//!
//! Provides extensible hooks for training loop events:
//! - `on_train_begin` / `on_train_end`
//! - `on_epoch_begin` / `on_epoch_end`
//! - `on_step_end` / `on_evaluate`
//!
//! # Example
//!
//! ```rust
//! use orquestar::train::callback::{CallbackAction, CallbackContext, TrainerCallback};
//!
//! struct StopAfter(usize);
//!
//! impl TrainerCallback for StopAfter {
//!     fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
//!         if ctx.global_step >= self.0 {
//!             CallbackAction::Stop
//!         } else {
//!             CallbackAction::Continue
//!         }
//!     }
//! }
//! ```

mod manager;
mod progress;
mod traits;

pub use manager::CallbackManager;
pub use progress::ProgressCallback;
pub use traits::{CallbackAction, CallbackContext, TrainerCallback};
