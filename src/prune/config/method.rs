//! Pruning method enumeration.

use serde::{Deserialize, Serialize};

/// Importance criterion used to pick which weights to remove.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PruneMethod {
    /// Magnitude-based pruning (Han et al., 2015).
    /// Score is `|w|`; needs nothing beyond the weights.
    #[default]
    Magnitude,

    /// Sensitivity with momentum: score accumulates `|w · ∂L/∂w|`
    /// across steps, decayed by `beta`. Falls back to magnitude until
    /// the first gradient has been observed.
    SnipMomentum {
        /// Decay applied to the running score each step.
        beta: f32,
    },
}

impl PruneMethod {
    /// Snip-momentum with the customary decay of 0.9.
    pub fn snip_momentum() -> Self {
        PruneMethod::SnipMomentum { beta: 0.9 }
    }

    /// Whether scores depend on gradients.
    pub fn uses_gradients(&self) -> bool {
        matches!(self, PruneMethod::SnipMomentum { .. })
    }

    /// Get the display name for this method.
    pub fn display_name(&self) -> &'static str {
        match self {
            PruneMethod::Magnitude => "Magnitude",
            PruneMethod::SnipMomentum { .. } => "SNIP (momentum)",
        }
    }
}
