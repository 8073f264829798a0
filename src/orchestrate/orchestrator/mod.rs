//! Combined optimization loop
//!
//! [`Orchestrator::optimize`] runs one training loop in which every
//! requested technique acts on the same student:
//! - pruning masks are recomputed on schedule at step begin
//! - the distillation loss replaces plain cross-entropy when a teacher is configured
//! - quantized wrappers fake-quantize weights and activations in every forward pass
//!
//! # Example
//!
//! ```no_run
//! use orquestar::config::ConfigList;
//! use orquestar::orchestrate::{Orchestrator, RunEnvironment, TrainingContext};
//! use orquestar::prune::PruningConfig;
//! use orquestar::quant::QuantizationConfig;
//! use orquestar::train::TrainingArgs;
//! # use orquestar::data::Dataset;
//! # use orquestar::model::SequenceClassifier;
//! # let student: SequenceClassifier = todo!();
//! # let train: Dataset = todo!();
//!
//! let configs = ConfigList::new()
//!     .with(PruningConfig::default().with_window(0, 2).with_target_sparsity(0.64))
//!     .with(QuantizationConfig::default());
//! let ctx = TrainingContext::new(train.clone()).with_calibration(train);
//!
//! let mut orchestrator = Orchestrator::new(RunEnvironment::default(), TrainingArgs::default());
//! let optimized = orchestrator.optimize(student, &ctx, &configs)?;
//! assert!(optimized.model().classifier().type_name().contains("quantize"));
//! # Ok::<(), orquestar::Error>(())
//! ```

mod core;
mod run;
mod state;
mod step;


pub use core::Orchestrator;
