//! Pruning callback implementation
//!
//! Recomputes masks on the configured schedule at the start of each step and
//! checks the achieved sparsity once training ends.

use std::collections::HashMap;

use ndarray::Array2;
use tracing::{debug, info};

use crate::config::Technique;
use crate::model::{Gradients, SequenceClassifier};
use crate::orchestrate::{AppliedTechnique, CompressionCallback, OptimizationError, PassContext, StepInfo};
use crate::prune::config::{PruneMethod, PruningConfig, PruningScope, ResolvedPruner};
use crate::prune::mask::{compute_masks, MaskInput};

/// Callback applying scheduled magnitude or sensitivity pruning.
///
/// # Example
///
/// ```
/// use orquestar::prune::{PruningCallback, PruningConfig};
///
/// let callback = PruningCallback::new(PruningConfig::default().with_window(0, 2).with_target_sparsity(0.64));
/// assert_eq!(callback.target_sparsity(), 0.64);
/// assert_eq!(callback.current_sparsity(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct PruningCallback {
    /// Configuration for pruning
    config: PruningConfig,
    /// Pruners resolved against the model at train begin
    pruners: Vec<ResolvedPruner>,
    /// Running sensitivity scores per layer (snip-momentum only)
    scores: HashMap<String, Array2<f32>>,
    /// Mean sparsity of the pruned layers after the last update
    current_sparsity: f32,
    /// Step when last pruning occurred
    last_prune_step: Option<usize>,
    /// Number of mask updates applied
    prune_events: usize,
}

impl PruningCallback {
    /// Create a new pruning callback with the given configuration.
    pub fn new(config: PruningConfig) -> Self {
        Self {
            config,
            pruners: Vec::new(),
            scores: HashMap::new(),
            current_sparsity: 0.0,
            last_prune_step: None,
            prune_events: 0,
        }
    }

    pub fn config(&self) -> &PruningConfig {
        &self.config
    }

    /// Get the target sparsity from the configuration.
    pub fn target_sparsity(&self) -> f32 {
        self.config.target_sparsity()
    }

    /// Mean sparsity over pruned layers after the last mask update.
    pub fn current_sparsity(&self) -> f32 {
        self.current_sparsity
    }

    pub fn last_prune_step(&self) -> Option<usize> {
        self.last_prune_step
    }

    pub fn prune_events(&self) -> usize {
        self.prune_events
    }

    /// Layers touched by any pruner
    pub fn pruned_layers(&self) -> Vec<String> {
        let mut layers: Vec<String> = Vec::new();
        for name in self.pruners.iter().flat_map(|p| &p.layers) {
            if !layers.contains(name) {
                layers.push(name.clone());
            }
        }
        layers
    }

    /// Compute progress through the pruning schedule (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        let target = self.config.target_sparsity();
        if target <= 0.0 {
            return 1.0;
        }
        (self.current_sparsity / target).clamp(0.0, 1.0)
    }

    fn importance(&self, model: &SequenceClassifier, layer: &str) -> Option<Array2<f32>> {
        let module = model.layer(layer)?;
        if self.config.method().uses_gradients() {
            if let Some(score) = self.scores.get(layer) {
                return Some(score.clone());
            }
        }
        Some(module.linear().effective_weight().mapv(f32::abs))
    }

    fn prune_to(
        &self,
        model: &mut SequenceClassifier,
        pruner: &ResolvedPruner,
        sparsity: f32,
    ) -> Result<(), OptimizationError> {
        let mut scores = Vec::with_capacity(pruner.layers.len());
        for name in &pruner.layers {
            let score = self.importance(model, name).ok_or_else(|| OptimizationError::TechniqueNotApplied {
                technique: Technique::Pruning,
                reason: format!("unknown layer {name}"),
            })?;
            scores.push(score);
        }

        let masks = {
            let inputs: Vec<MaskInput<'_>> = pruner
                .layers
                .iter()
                .zip(&scores)
                .map(|(name, scores)| MaskInput {
                    scores,
                    current: model.layer(name).and_then(|l| l.linear().mask()),
                })
                .collect();
            compute_masks(&inputs, self.config.pattern(), self.config.scope(), sparsity)
                .map_err(OptimizationError::Pruning)?
        };

        for (name, mask) in pruner.layers.iter().zip(masks) {
            if let Some(layer) = model.layer_mut(name) {
                layer.linear_mut().set_mask(mask);
            }
        }
        Ok(())
    }

    fn mean_sparsity(&self, model: &SequenceClassifier) -> f32 {
        let layers = self.pruned_layers();
        if layers.is_empty() {
            return 0.0;
        }
        let total: f32 = layers
            .iter()
            .filter_map(|name| model.layer(name))
            .map(|layer| layer.linear().sparsity())
            .sum();
        total / layers.len() as f32
    }
}

impl CompressionCallback for PruningCallback {
    fn technique(&self) -> Technique {
        Technique::Pruning
    }

    fn on_train_begin(
        &mut self,
        model: &mut SequenceClassifier,
        _ctx: &PassContext<'_>,
    ) -> Result<(), OptimizationError> {
        self.pruners = self.config.resolve(model.layer_names());
        info!(
            method = self.config.method().display_name(),
            target = self.config.target_sparsity(),
            layers = ?self.pruned_layers(),
            "pruning enabled"
        );
        Ok(())
    }

    fn on_step_begin(&mut self, model: &mut SequenceClassifier, step: &StepInfo) -> Result<(), OptimizationError> {
        let due: Vec<(ResolvedPruner, f32)> = self
            .pruners
            .iter()
            .filter(|p| p.schedule.should_prune_at_step(step.global_step))
            .map(|p| (p.clone(), p.schedule.sparsity_at_step(p.target_sparsity, step.global_step)))
            .collect();

        for (pruner, sparsity) in due {
            if sparsity <= 0.0 {
                continue;
            }
            self.prune_to(model, &pruner, sparsity)?;
            self.last_prune_step = Some(step.global_step);
            self.prune_events += 1;
            debug!(step = step.global_step, sparsity, layers = ?pruner.layers, "updated pruning masks");
        }
        self.current_sparsity = self.mean_sparsity(model);
        Ok(())
    }

    fn on_gradients(&mut self, model: &SequenceClassifier, grads: &Gradients) {
        let PruneMethod::SnipMomentum { beta } = self.config.method() else {
            return;
        };
        for name in self.pruned_layers() {
            let (Some(layer), Some(grad)) = (model.layer(&name), grads.layer(&name)) else {
                continue;
            };
            let sensitivity = (&layer.linear().effective_weight() * &grad.weight).mapv(f32::abs);
            self.scores
                .entry(name)
                .and_modify(|score| {
                    score.zip_mut_with(&sensitivity, |s, &x| *s = beta * *s + x);
                })
                .or_insert(sensitivity);
        }
    }

    fn on_train_end(&mut self, model: &mut SequenceClassifier, step: &StepInfo) -> Result<(), OptimizationError> {
        self.current_sparsity = self.mean_sparsity(model);
        info!(
            step = step.global_step,
            sparsity = self.current_sparsity,
            events = self.prune_events,
            "pruning finished"
        );
        Ok(())
    }

    fn verify(&self, model: &SequenceClassifier, tolerance: f32) -> Result<AppliedTechnique, OptimizationError> {
        for pruner in &self.pruners {
            let mut achieved = Vec::with_capacity(pruner.layers.len());
            for name in &pruner.layers {
                let layer = model.layer(name).ok_or_else(|| OptimizationError::TechniqueNotApplied {
                    technique: Technique::Pruning,
                    reason: format!("unknown layer {name}"),
                })?;
                let linear = layer.linear();
                if pruner.target_sparsity > 0.0 && linear.mask().is_none() {
                    return Err(OptimizationError::TechniqueNotApplied {
                        technique: Technique::Pruning,
                        reason: format!("layer {name} has no pruning mask"),
                    });
                }
                achieved.push((name.clone(), linear.sparsity(), linear.weight.len()));
            }

            let checks: Vec<(String, f32)> = match self.config.scope() {
                PruningScope::Local => achieved.iter().map(|(n, s, _)| (n.clone(), *s)).collect(),
                PruningScope::Global => {
                    let total: usize = achieved.iter().map(|(_, _, len)| len).sum();
                    let zeros: f32 = achieved.iter().map(|(_, s, len)| s * *len as f32).sum();
                    vec![(pruner.layers.join("+"), zeros / total.max(1) as f32)]
                }
            };
            for (layer, sparsity) in checks {
                if (sparsity - pruner.target_sparsity).abs() > tolerance {
                    return Err(OptimizationError::SparsityNotReached {
                        layer,
                        achieved: sparsity,
                        target: pruner.target_sparsity,
                        tolerance,
                    });
                }
            }
        }

        Ok(AppliedTechnique {
            technique: Technique::Pruning,
            layers: self.pruned_layers(),
            detail: format!(
                "{} pruning to {:.2} sparsity ({} mask updates)",
                self.config.method().display_name(),
                self.config.target_sparsity(),
                self.prune_events
            ),
        })
    }

    fn name(&self) -> &'static str {
        "PruningCallback"
    }
}
