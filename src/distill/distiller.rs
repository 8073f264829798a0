//! Teacher-student pairing used inside the combined loop

use ndarray::Array2;

use crate::config::Technique;
use crate::data::Batch;
use crate::model::SequenceClassifier;
use crate::orchestrate::{AppliedTechnique, OptimizationError};

use super::config::DistillationConfig;
use super::loss::{DistillationLoss, DistillationOutput};

/// Borrows the teacher for the whole run and turns student logits into a
/// combined loss and gradient.
///
/// The teacher only ever runs [`SequenceClassifier::forward`], so its
/// weights and any quantization observers stay untouched.
#[derive(Debug)]
pub struct Distiller<'t> {
    teacher: &'t SequenceClassifier,
    loss: DistillationLoss,
    steps: usize,
}

impl<'t> Distiller<'t> {
    pub fn new(teacher: &'t SequenceClassifier, config: &DistillationConfig) -> Result<Self, OptimizationError> {
        let loss = DistillationLoss::new(config.criterion.clone()).map_err(OptimizationError::Distillation)?;
        Ok(Self { teacher, loss, steps: 0 })
    }

    pub fn teacher(&self) -> &'t SequenceClassifier {
        self.teacher
    }

    /// Steps that included the teacher term
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn forward(&mut self, batch: &Batch, student_logits: &Array2<f32>) -> DistillationOutput {
        let teacher_logits = self.teacher.forward(batch);
        self.steps += 1;
        self.loss.forward(student_logits, &teacher_logits, &batch.labels)
    }

    pub fn applied(&self) -> Result<AppliedTechnique, OptimizationError> {
        if self.steps == 0 {
            return Err(OptimizationError::TechniqueNotApplied {
                technique: Technique::Distillation,
                reason: "no training step used the teacher".to_string(),
            });
        }
        let criterion = self.loss.criterion();
        Ok(AppliedTechnique {
            technique: Technique::Distillation,
            layers: Vec::new(),
            detail: format!(
                "{}+{} at temperature {} over {} steps",
                criterion.loss_types[0], criterion.loss_types[1], criterion.temperature, self.steps
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, Dataset, HashingTokenizer, TokenizerOptions};
    use crate::distill::{DistillationLossKind, KnowledgeDistillationLossConfig};
    use crate::model::ModelConfig;
    use crate::train::cross_entropy;

    fn batch() -> Batch {
        let ds = Dataset::from_texts(
            [("a gripping film", 1), ("dull and slow", 0), ("warm", 1), ("flat", 0)],
            &HashingTokenizer::new(64),
            &TokenizerOptions::default(),
        )
        .unwrap();
        DataLoader::new(&ds, 4).unwrap().epoch(0).remove(0)
    }

    fn classifier(seed: u64) -> SequenceClassifier {
        SequenceClassifier::new(ModelConfig::default().with_vocab_size(64).with_embed_dim(8).with_hidden_size(8), seed)
            .unwrap()
    }

    #[test]
    fn test_applied_requires_a_step() {
        let teacher = classifier(7);
        let distiller = Distiller::new(&teacher, &DistillationConfig::default()).unwrap();
        assert!(matches!(
            distiller.applied(),
            Err(OptimizationError::TechniqueNotApplied { technique: Technique::Distillation, .. })
        ));
    }

    #[test]
    fn test_identical_teacher_never_raises_loss() {
        let student = classifier(3);
        let teacher = student.clone();
        let config = DistillationConfig::new(
            KnowledgeDistillationLossConfig::default().with_loss_types(DistillationLossKind::CE, DistillationLossKind::KL),
        );
        let mut distiller = Distiller::new(&teacher, &config).unwrap();

        let batch = batch();
        let logits = student.forward(&batch);
        let out = distiller.forward(&batch, &logits);
        let (task, _) = cross_entropy(&logits, &batch.labels);

        assert!(out.distill_loss.abs() < 1e-5);
        assert!(out.total <= task + 1e-6);
        assert_eq!(distiller.steps(), 1);

        let applied = distiller.applied().unwrap();
        assert!(applied.layers.is_empty());
        assert!(applied.detail.starts_with("CE+KL"));
    }

    #[test]
    fn test_teacher_is_not_modified() {
        let student = classifier(3);
        let teacher = classifier(9);
        let before = teacher.classifier().linear().weight.clone();
        let mut distiller = Distiller::new(&teacher, &DistillationConfig::default()).unwrap();
        let batch = batch();
        distiller.forward(&batch, &student.forward(&batch));
        assert_eq!(teacher.classifier().linear().weight, before);
    }
}
