//! Typed optimization configs

use serde::{Deserialize, Serialize};

use crate::distill::DistillationConfig;
use crate::prune::PruningConfig;
use crate::quant::QuantizationConfig;

/// Compression technique, ordered by composition.
///
/// Pruning masks are computed on the full-precision weights, distillation
/// shapes the loss, and quantization wraps whatever the first two leave
/// behind. The order of a [`super::ConfigList`] never changes this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Pruning,
    Distillation,
    Quantization,
}

impl Technique {
    /// Position in the fixed composition order
    pub fn rank(self) -> usize {
        match self {
            Technique::Pruning => 0,
            Technique::Distillation => 1,
            Technique::Quantization => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Technique::Pruning => "pruning",
            Technique::Distillation => "distillation",
            Technique::Quantization => "quantization",
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested optimization.
///
/// In YAML the variant is selected by a `type` key:
///
/// ```yaml
/// - type: pruning
///   target_sparsity: 0.64
///   pruners:
///     - start_step: 0
///       end_step: 2
/// - type: distillation
///   criterion:
///     loss_types: [CE, KL]
/// - type: quantization
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizationConfig {
    Pruning(PruningConfig),
    Distillation(DistillationConfig),
    Quantization(QuantizationConfig),
}

impl OptimizationConfig {
    pub fn technique(&self) -> Technique {
        match self {
            OptimizationConfig::Pruning(_) => Technique::Pruning,
            OptimizationConfig::Distillation(_) => Technique::Distillation,
            OptimizationConfig::Quantization(_) => Technique::Quantization,
        }
    }

    /// Check the config in isolation
    pub fn validate(&self) -> Result<(), String> {
        match self {
            OptimizationConfig::Pruning(c) => c.validate(),
            OptimizationConfig::Distillation(c) => c.validate(),
            OptimizationConfig::Quantization(c) => c.validate(),
        }
    }
}

impl From<PruningConfig> for OptimizationConfig {
    fn from(config: PruningConfig) -> Self {
        OptimizationConfig::Pruning(config)
    }
}

impl From<DistillationConfig> for OptimizationConfig {
    fn from(config: DistillationConfig) -> Self {
        OptimizationConfig::Distillation(config)
    }
}

impl From<QuantizationConfig> for OptimizationConfig {
    fn from(config: QuantizationConfig) -> Self {
        OptimizationConfig::Quantization(config)
    }
}
