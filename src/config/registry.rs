//! Ordered optimization configs, validated as a set

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::optimization::{OptimizationConfig, Technique};
use crate::distill::DistillationConfig;
use crate::model::SequenceClassifier;
use crate::orchestrate::TrainingContext;
use crate::prune::PruningConfig;
use crate::quant::QuantizationConfig;
use crate::train::TrainingArgs;

/// The optimization configs driving one run.
///
/// List order is preserved for display; execution always follows
/// [`Technique`] order (see [`ConfigList::ordered`]).
///
/// # Example
///
/// ```
/// use orquestar::config::{ConfigList, Technique};
/// use orquestar::prune::PruningConfig;
/// use orquestar::quant::QuantizationConfig;
///
/// let configs = ConfigList::new()
///     .with(QuantizationConfig::default())
///     .with(PruningConfig::default().with_window(0, 2));
/// let order: Vec<Technique> = configs.ordered().iter().map(|c| c.technique()).collect();
/// assert_eq!(order, vec![Technique::Pruning, Technique::Quantization]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigList {
    configs: Vec<OptimizationConfig>,
}

impl ConfigList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a config
    pub fn with(mut self, config: impl Into<OptimizationConfig>) -> Self {
        self.configs.push(config.into());
        self
    }

    pub fn push(&mut self, config: impl Into<OptimizationConfig>) {
        self.configs.push(config.into());
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptimizationConfig> {
        self.configs.iter()
    }

    /// Configs in composition order; ties keep list order
    pub fn ordered(&self) -> Vec<&OptimizationConfig> {
        let mut ordered: Vec<&OptimizationConfig> = self.configs.iter().collect();
        ordered.sort_by_key(|c| c.technique().rank());
        ordered
    }

    /// Distinct techniques in composition order
    pub fn techniques(&self) -> Vec<Technique> {
        let mut techniques: Vec<Technique> = self.configs.iter().map(OptimizationConfig::technique).collect();
        techniques.sort();
        techniques.dedup();
        techniques
    }

    pub fn contains(&self, technique: Technique) -> bool {
        self.configs.iter().any(|c| c.technique() == technique)
    }

    pub fn pruning(&self) -> impl Iterator<Item = &PruningConfig> {
        self.configs.iter().filter_map(|c| match c {
            OptimizationConfig::Pruning(p) => Some(p),
            _ => None,
        })
    }

    pub fn distillation(&self) -> Option<&DistillationConfig> {
        self.configs.iter().find_map(|c| match c {
            OptimizationConfig::Distillation(d) => Some(d),
            _ => None,
        })
    }

    pub fn quantization(&self) -> Option<&QuantizationConfig> {
        self.configs.iter().find_map(|c| match c {
            OptimizationConfig::Quantization(q) => Some(q),
            _ => None,
        })
    }

    /// Validate the list against the student, the run's data and its
    /// training arguments.
    pub fn validate(
        &self,
        ctx: &TrainingContext<'_>,
        student: &SequenceClassifier,
        args: &TrainingArgs,
    ) -> Result<(), ConfigError> {
        if self.configs.is_empty() {
            return Err(ConfigError::EmptyConfigList);
        }
        args.validate().map_err(ConfigError::InvalidArgs)?;
        if let Some(metric) = &ctx.metric {
            metric.validate().map_err(ConfigError::InvalidMetric)?;
        }

        for config in &self.configs {
            config
                .validate()
                .map_err(|message| ConfigError::Invalid { technique: config.technique(), message })?;
        }

        for technique in [Technique::Distillation, Technique::Quantization] {
            if self.configs.iter().filter(|c| c.technique() == technique).count() > 1 {
                return Err(ConfigError::DuplicateTechnique(technique));
            }
        }

        Self::validate_labels(ctx, student)?;

        let total_steps = args.total_steps(ctx.train.len());
        self.validate_pruning(student, total_steps)?;

        if self.distillation().is_some() {
            let teacher = ctx.teacher().ok_or(ConfigError::MissingTeacher)?;
            if teacher.num_labels() != student.num_labels() {
                return Err(ConfigError::LabelSpaceMismatch {
                    student: student.num_labels(),
                    teacher: teacher.num_labels(),
                });
            }
        }

        if let Some(quant) = self.quantization() {
            for layer in quant.target_layers() {
                if student.layer(layer).is_none() {
                    return Err(ConfigError::UnknownLayer {
                        technique: Technique::Quantization,
                        layer: layer.clone(),
                    });
                }
            }
            if quant.requires_calibration() && ctx.calibration.is_none() {
                return Err(ConfigError::MissingCalibrationSource);
            }
        }

        Ok(())
    }

    fn validate_labels(ctx: &TrainingContext<'_>, student: &SequenceClassifier) -> Result<(), ConfigError> {
        let splits = [
            ("train", Some(&ctx.train)),
            ("eval", ctx.eval.as_ref()),
            ("calibration", ctx.calibration.as_ref()),
        ];
        for (split, dataset) in splits {
            let Some(dataset) = dataset else { continue };
            if dataset.num_labels() > student.num_labels() {
                return Err(ConfigError::LabelOutOfRange {
                    split: split.to_string(),
                    label: dataset.num_labels() - 1,
                    num_labels: student.num_labels(),
                });
            }
        }
        Ok(())
    }

    fn validate_pruning(&self, student: &SequenceClassifier, total_steps: usize) -> Result<(), ConfigError> {
        let mut claimed: HashSet<String> = HashSet::new();

        for config in self.pruning() {
            for pruner in config.resolve(student.layer_names()) {
                for layer in &pruner.layers {
                    let module = student.layer(layer).ok_or_else(|| ConfigError::UnknownLayer {
                        technique: Technique::Pruning,
                        layer: layer.clone(),
                    })?;
                    let linear = module.linear();
                    config
                        .pattern()
                        .check_shape(linear.out_features(), linear.in_features())
                        .map_err(|message| ConfigError::Invalid {
                            technique: Technique::Pruning,
                            message: format!("layer {layer}: {message}"),
                        })?;
                    if !claimed.insert(layer.clone()) {
                        return Err(ConfigError::LayerConflict { layer: layer.clone() });
                    }
                }
            }

            if config.last_step() >= total_steps {
                return Err(ConfigError::ScheduleExceedsTraining {
                    last_step: config.last_step(),
                    total_steps,
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<OptimizationConfig>> for ConfigList {
    fn from(configs: Vec<OptimizationConfig>) -> Self {
        Self { configs }
    }
}

impl FromIterator<OptimizationConfig> for ConfigList {
    fn from_iter<I: IntoIterator<Item = OptimizationConfig>>(iter: I) -> Self {
        Self { configs: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ConfigList {
    type Item = &'a OptimizationConfig;
    type IntoIter = std::slice::Iter<'a, OptimizationConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.configs.iter()
    }
}
