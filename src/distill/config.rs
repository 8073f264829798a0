//! Distillation configuration

use serde::{Deserialize, Serialize};

/// Loss term kind.
///
/// For the student-vs-label term, `CE` and `KL` coincide (KL against a
/// one-hot target is cross-entropy) and `MSE` compares probabilities with the
/// one-hot target. For the student-vs-teacher term, `CE` and `KL` compare
/// temperature-softened distributions and `MSE` compares raw logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistillationLossKind {
    CE,
    KL,
    MSE,
}

impl std::fmt::Display for DistillationLossKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DistillationLossKind::CE => "CE",
            DistillationLossKind::KL => "KL",
            DistillationLossKind::MSE => "MSE",
        };
        f.write_str(name)
    }
}

/// Loss criterion for knowledge distillation.
///
/// `loss_types[0]` scores the student against the labels, `loss_types[1]`
/// against the teacher. The combined loss is the weighted mean of the two
/// terms, so it always lies between them.
///
/// # Example
///
/// ```
/// use orquestar::distill::{DistillationLossKind, KnowledgeDistillationLossConfig};
///
/// let criterion = KnowledgeDistillationLossConfig::default()
///     .with_loss_types(DistillationLossKind::CE, DistillationLossKind::KL);
/// assert!(criterion.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeDistillationLossConfig {
    /// Softmax temperature for the teacher term.
    pub temperature: f32,
    /// `[student-vs-label, student-vs-teacher]`
    pub loss_types: Vec<DistillationLossKind>,
    /// Weights for the two terms.
    pub loss_weights: Vec<f32>,
}

impl Default for KnowledgeDistillationLossConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            loss_types: vec![DistillationLossKind::CE, DistillationLossKind::CE],
            loss_weights: vec![0.5, 0.5],
        }
    }
}

impl KnowledgeDistillationLossConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_loss_types(mut self, label: DistillationLossKind, teacher: DistillationLossKind) -> Self {
        self.loss_types = vec![label, teacher];
        self
    }

    pub fn with_loss_weights(mut self, label: f32, teacher: f32) -> Self {
        self.loss_weights = vec![label, teacher];
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loss_types.len() != 2 {
            return Err(format!("loss_types must have exactly 2 entries (got {})", self.loss_types.len()));
        }
        if self.loss_weights.len() != 2 {
            return Err(format!(
                "loss_weights must have exactly 2 entries (got {})",
                self.loss_weights.len()
            ));
        }
        if self.loss_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(format!("loss_weights must be non-negative (got {:?})", self.loss_weights));
        }
        if self.loss_weights.iter().sum::<f32>() <= 0.0 {
            return Err("loss_weights must not sum to zero".to_string());
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(format!("temperature must be positive (got {})", self.temperature));
        }
        Ok(())
    }
}

/// Knowledge distillation settings.
///
/// The teacher model itself is passed to the orchestrator; `teacher` only
/// names it for run specs loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillationConfig {
    pub criterion: KnowledgeDistillationLossConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
}

impl DistillationConfig {
    pub fn new(criterion: KnowledgeDistillationLossConfig) -> Self {
        Self { criterion, teacher: None }
    }

    pub fn with_teacher(mut self, identifier: impl Into<String>) -> Self {
        self.teacher = Some(identifier.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.criterion.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = KnowledgeDistillationLossConfig::default();
        assert_eq!(c.temperature, 1.0);
        assert_eq!(c.loss_types, vec![DistillationLossKind::CE, DistillationLossKind::CE]);
        assert_eq!(c.loss_weights, vec![0.5, 0.5]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = KnowledgeDistillationLossConfig::default();
        let mut three = base.clone();
        three.loss_types.push(DistillationLossKind::MSE);
        assert!(three.validate().is_err());
        assert!(base.clone().with_loss_weights(-0.1, 1.0).validate().is_err());
        assert!(base.clone().with_loss_weights(0.0, 0.0).validate().is_err());
        assert!(base.clone().with_temperature(0.0).validate().is_err());
        assert!(base.with_loss_weights(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_yaml_kinds() {
        let yaml = "criterion:\n  loss_types: [CE, KL]\n  temperature: 2.0\nteacher: sst2-teacher\n";
        let config: DistillationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.criterion.loss_types, vec![DistillationLossKind::CE, DistillationLossKind::KL]);
        assert_eq!(config.criterion.loss_weights, vec![0.5, 0.5]);
        assert_eq!(config.teacher.as_deref(), Some("sst2-teacher"));
        assert_eq!(DistillationLossKind::MSE.to_string(), "MSE");
    }
}
