//! Main pruning configuration struct.

use serde::{Deserialize, Serialize};

use super::{PruneMethod, SparsityPatternConfig};
use crate::prune::schedule::PruningSchedule;

/// Whether sparsity targets apply per layer or across all pruned layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruningScope {
    /// Each layer reaches the target on its own.
    #[default]
    Local,
    /// Weights compete across layers; only the total reaches the target.
    Global,
}

/// Shape of the sparsity ramp inside each pruner window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    OneShot,
    Gradual,
    #[default]
    Cubic,
}

/// One pruner: a step window, optionally with its own layers and target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrunerWindow {
    pub start_step: usize,
    pub end_step: usize,
    /// Layers for this pruner; empty inherits the config's layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_layers: Vec<String>,
    /// Overrides the config's target sparsity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sparsity: Option<f32>,
}

impl PrunerWindow {
    pub fn new(start_step: usize, end_step: usize) -> Self {
        Self { start_step, end_step, target_layers: Vec::new(), target_sparsity: None }
    }

    pub fn with_target_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_sparsity(mut self, sparsity: f32) -> Self {
        self.target_sparsity = Some(sparsity);
        self
    }

    /// Concrete schedule for this window
    pub fn schedule(&self, kind: ScheduleKind, frequency: usize) -> PruningSchedule {
        let (start_step, end_step) = (self.start_step, self.end_step);
        match kind {
            ScheduleKind::OneShot => PruningSchedule::OneShot { step: end_step },
            ScheduleKind::Gradual => PruningSchedule::Gradual { start_step, end_step, frequency },
            ScheduleKind::Cubic => PruningSchedule::Cubic { start_step, end_step, frequency },
        }
    }
}

/// A pruner with its layers and schedule resolved against a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPruner {
    pub layers: Vec<String>,
    pub target_sparsity: f32,
    pub schedule: PruningSchedule,
}

/// Configuration for training-time weight pruning.
///
/// # Example
///
/// ```
/// use orquestar::prune::{PruningConfig, PruningScope};
///
/// let config = PruningConfig::default()
///     .with_window(0, 2)
///     .with_target_sparsity(0.64)
///     .with_scope(PruningScope::Local);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.last_step(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningConfig {
    /// Importance criterion.
    method: PruneMethod,

    /// Target sparsity, `[0, 1)`.
    target_sparsity: f32,

    /// Sparsity pattern.
    pattern: SparsityPatternConfig,

    /// Local or global ranking.
    scope: PruningScope,

    /// Ramp shape used by every pruner window.
    schedule: ScheduleKind,

    /// Recompute masks every N steps inside a window.
    frequency: usize,

    /// Pruner windows.
    pruners: Vec<PrunerWindow>,

    /// Layers to prune; empty means every layer not excluded.
    target_layers: Vec<String>,

    /// Layers never pruned unless named explicitly.
    excluded_layers: Vec<String>,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            method: PruneMethod::default(),
            target_sparsity: 0.5,
            pattern: SparsityPatternConfig::default(),
            scope: PruningScope::default(),
            schedule: ScheduleKind::default(),
            frequency: 1,
            pruners: vec![PrunerWindow::new(0, 0)],
            target_layers: Vec::new(),
            excluded_layers: vec![crate::model::CLASSIFIER.to_string()],
        }
    }
}

impl PruningConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: PruneMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_target_sparsity(mut self, sparsity: f32) -> Self {
        self.target_sparsity = sparsity;
        self
    }

    pub fn with_pattern(mut self, pattern: SparsityPatternConfig) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_scope(mut self, scope: PruningScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_schedule(mut self, schedule: ScheduleKind) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_frequency(mut self, frequency: usize) -> Self {
        self.frequency = frequency;
        self
    }

    /// Replace the pruners with a single window over `start..=end`.
    pub fn with_window(mut self, start_step: usize, end_step: usize) -> Self {
        self.pruners = vec![PrunerWindow::new(start_step, end_step)];
        self
    }

    pub fn with_pruners(mut self, pruners: Vec<PrunerWindow>) -> Self {
        self.pruners = pruners;
        self
    }

    pub fn with_target_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_excluded_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn method(&self) -> PruneMethod {
        self.method
    }

    pub fn target_sparsity(&self) -> f32 {
        self.target_sparsity
    }

    pub fn pattern(&self) -> &SparsityPatternConfig {
        &self.pattern
    }

    pub fn scope(&self) -> PruningScope {
        self.scope
    }

    pub fn schedule(&self) -> ScheduleKind {
        self.schedule
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn pruners(&self) -> &[PrunerWindow] {
        &self.pruners
    }

    pub fn target_layers(&self) -> &[String] {
        &self.target_layers
    }

    pub fn excluded_layers(&self) -> &[String] {
        &self.excluded_layers
    }

    /// Last step of any pruner window
    pub fn last_step(&self) -> usize {
        self.pruners.iter().map(|p| p.end_step).max().unwrap_or(0)
    }

    /// Resolve every pruner window against the model's layer names.
    ///
    /// Layer precedence: the window's own list, then the config's
    /// `target_layers`, then every layer not in `excluded_layers`.
    pub fn resolve(&self, layer_names: &[&str]) -> Vec<ResolvedPruner> {
        self.pruners
            .iter()
            .map(|window| {
                let layers = if !window.target_layers.is_empty() {
                    window.target_layers.clone()
                } else if !self.target_layers.is_empty() {
                    self.target_layers.clone()
                } else {
                    layer_names
                        .iter()
                        .filter(|name| !self.excluded_layers.iter().any(|ex| ex == *name))
                        .map(|name| name.to_string())
                        .collect()
                };
                ResolvedPruner {
                    layers,
                    target_sparsity: window.target_sparsity.unwrap_or(self.target_sparsity),
                    schedule: window.schedule(self.schedule, self.frequency),
                }
            })
            .collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.pruners.is_empty() {
            return Err("at least one pruner window is required".to_string());
        }

        let targets = std::iter::once(self.target_sparsity)
            .chain(self.pruners.iter().filter_map(|p| p.target_sparsity));
        for sparsity in targets {
            if !(0.0..1.0).contains(&sparsity) {
                return Err(format!("target_sparsity ({sparsity}) must be in [0.0, 1.0)"));
            }
            if let Some(fixed) = self.pattern.theoretical_sparsity() {
                if (sparsity - fixed).abs() > 1e-3 {
                    return Err(format!(
                        "target_sparsity ({sparsity}) must equal the N:M pattern sparsity ({fixed})"
                    ));
                }
            }
        }

        for window in &self.pruners {
            window.schedule(self.schedule, self.frequency).validate()?;
        }

        self.pattern.validate()?;
        if self.scope == PruningScope::Global && self.pattern.theoretical_sparsity().is_some() {
            return Err("N:M patterns are per-group and cannot use global scope".to_string());
        }

        if let PruneMethod::SnipMomentum { beta } = self.method {
            if !(0.0..1.0).contains(&beta) {
                return Err(format!("beta ({beta}) must be in [0.0, 1.0)"));
            }
        }

        Ok(())
    }
}
