//! Orquestar: combined model compression
//!
//! Applies magnitude pruning, knowledge distillation and quantization-aware
//! training to a single student classifier inside one training loop, and
//! returns a model whose structure reflects every requested technique.
//!
//! # Architecture
//!
//! - `config`: typed optimization configs, the config registry, run specs and CLI types
//! - `orchestrate`: the combined training loop
//! - `prune` / `distill` / `quant`: the individual techniques
//! - `model`: the sequence classifier, its layers and the local model hub
//! - `data`: tokenization, datasets and batching
//! - `train` / `optim`: losses, callbacks, training arguments and AdamW
//! - `eval`: evaluation and metric acceptance
//!
//! # Example
//!
//! ```no_run
//! use orquestar::config::ConfigList;
//! use orquestar::data::{Dataset, HashingTokenizer, TokenizerOptions};
//! use orquestar::distill::DistillationConfig;
//! use orquestar::model::ModelHub;
//! use orquestar::orchestrate::{Orchestrator, RunEnvironment, TrainingContext};
//! use orquestar::prune::PruningConfig;
//! use orquestar::quant::QuantizationConfig;
//! use orquestar::train::TrainingArgs;
//!
//! let hub = ModelHub::new("models");
//! let student = hub.load("student")?;
//! let teacher = hub.load("teacher")?;
//!
//! let tokenizer = HashingTokenizer::new(student.config().vocab_size);
//! let train = Dataset::from_jsonl("sst2.jsonl", &tokenizer, &TokenizerOptions::default())?.select(0..30)?;
//! let ctx = TrainingContext::new(train.clone())
//!     .with_eval(train.clone())
//!     .with_calibration(train)
//!     .with_teacher(&teacher);
//!
//! let configs = ConfigList::new()
//!     .with(PruningConfig::default().with_window(0, 2).with_target_sparsity(0.64))
//!     .with(DistillationConfig::default())
//!     .with(QuantizationConfig::default());
//!
//! let mut orchestrator = Orchestrator::new(RunEnvironment::default(), TrainingArgs::default());
//! let optimized = orchestrator.optimize(student, &ctx, &configs)?;
//! assert!(optimized.model().classifier().type_name().contains("quantize"));
//! # Ok::<(), orquestar::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod distill;
pub mod error;
pub mod eval;
pub mod model;
pub mod optim;
pub mod orchestrate;
pub mod prune;
pub mod quant;
pub mod train;

pub use error::{Error, Result};
