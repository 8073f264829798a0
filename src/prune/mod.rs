//! Training-time weight pruning
//!
//! - **Schedules**: OneShot, Gradual and Cubic sparsity ramps over step windows
//! - **Masks**: magnitude or sensitivity scores, unstructured / N:M / block
//!   patterns, local or global ranking
//! - **Callback**: [`PruningCallback`] updates masks inside the combined loop
//!
//! # Example
//!
//! ```
//! use orquestar::prune::{PruningCallback, PruningConfig, PruningScope};
//!
//! let config = PruningConfig::default()
//!     .with_window(0, 2)
//!     .with_target_sparsity(0.64)
//!     .with_scope(PruningScope::Local);
//! let callback = PruningCallback::new(config);
//! assert_eq!(callback.target_sparsity(), 0.64);
//! ```
//!
//! # References
//!
//! - Han, S., et al. (2015). Learning both weights and connections. NeurIPS.
//! - Lee, N., et al. (2019). SNIP: Single-shot network pruning based on connection sensitivity. ICLR.
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune. arXiv:1710.01878.

mod callback;
mod config;
mod mask;
mod schedule;

pub use callback::PruningCallback;
pub use config::{
    PruneMethod, PrunerWindow, PruningConfig, PruningScope, ResolvedPruner, ScheduleKind, SparsityPatternConfig,
};
pub use mask::{compute_masks, mask_sparsity, MaskInput};
pub use schedule::PruningSchedule;
