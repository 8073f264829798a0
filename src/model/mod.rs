//! Student and teacher model
//!
//! [`SequenceClassifier`] is the model every optimization technique acts on.
//! Its linear layers live in [`LayerModule`] slots addressed by name
//! (`"pre_classifier"`, `"classifier"`).

mod classifier;
mod error;
mod hub;
mod layer;
mod linear;

pub use classifier::{
    ForwardCache, Gradients, ModelConfig, SequenceClassifier, CLASSIFIER, CONFIG_FILE, PRE_CLASSIFIER,
    WEIGHTS_FILE,
};
pub use error::ModelError;
pub use hub::ModelHub;
pub use layer::LayerModule;
pub(crate) use linear::affine;
pub use linear::{Linear, LinearCache, LinearGrad, NEAR_ZERO};
