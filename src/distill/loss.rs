//! Distillation loss functions

use ndarray::{Array2, Axis};

use super::config::{DistillationLossKind, KnowledgeDistillationLossConfig};
use crate::train::loss::{cross_entropy, one_hot, softmax_2d, softmax_backward};

/// Loss value and logit gradient for one distillation step.
#[derive(Debug, Clone)]
pub struct DistillationOutput {
    /// Weighted mean of the two terms
    pub total: f32,
    /// Student-vs-label term
    pub student_loss: f32,
    /// Student-vs-teacher term
    pub distill_loss: f32,
    /// ∂total/∂student_logits, shape `[batch, num_classes]`
    pub grad: Array2<f32>,
}

/// Knowledge Distillation Loss
///
/// Combines a hard term against the labels with a soft term against the
/// teacher's logits, weighted by `loss_weights` and normalized by their sum.
///
/// # Formula
///
/// ```text
/// L = (w₀ · L_label + w₁ · L_teacher) / (w₀ + w₁)
/// L_teacher(KL) = T² · KL(softmax(teacher/T) || softmax(student/T))
/// ```
///
/// The T² factor keeps soft-target gradients on the same scale as the hard
/// term as the temperature grows.
///
/// # Example
///
/// ```
/// use orquestar::distill::{DistillationLoss, KnowledgeDistillationLossConfig};
/// use ndarray::array;
///
/// let loss_fn = DistillationLoss::new(KnowledgeDistillationLossConfig::default()).unwrap();
/// let student_logits = array![[2.0, 1.0, 0.5]];
/// let teacher_logits = array![[1.5, 1.2, 0.8]];
///
/// let out = loss_fn.forward(&student_logits, &teacher_logits, &[0]);
/// assert!(out.total > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DistillationLoss {
    criterion: KnowledgeDistillationLossConfig,
}

impl DistillationLoss {
    /// Create a distillation loss from a validated criterion.
    pub fn new(criterion: KnowledgeDistillationLossConfig) -> Result<Self, String> {
        criterion.validate()?;
        Ok(Self { criterion })
    }

    pub fn criterion(&self) -> &KnowledgeDistillationLossConfig {
        &self.criterion
    }

    pub fn temperature(&self) -> f32 {
        self.criterion.temperature
    }

    /// Compute the combined loss and its gradient w.r.t. the student logits.
    ///
    /// `student_logits` and `teacher_logits` must share the shape
    /// `[batch_size, num_classes]`; `labels` has one entry per row.
    pub fn forward(
        &self,
        student_logits: &Array2<f32>,
        teacher_logits: &Array2<f32>,
        labels: &[usize],
    ) -> DistillationOutput {
        debug_assert_eq!(student_logits.shape(), teacher_logits.shape());
        debug_assert_eq!(student_logits.nrows(), labels.len());

        let (student_loss, student_grad) = self.label_term(student_logits, labels);
        let (distill_loss, distill_grad) = self.teacher_term(student_logits, teacher_logits);

        let w_label = self.criterion.loss_weights[0];
        let w_teacher = self.criterion.loss_weights[1];
        let norm = w_label + w_teacher;

        let total = (w_label * student_loss + w_teacher * distill_loss) / norm;
        let grad = (student_grad * w_label + distill_grad * w_teacher) / norm;

        DistillationOutput { total, student_loss, distill_loss, grad }
    }

    fn label_term(&self, logits: &Array2<f32>, labels: &[usize]) -> (f32, Array2<f32>) {
        match self.criterion.loss_types[0] {
            DistillationLossKind::CE | DistillationLossKind::KL => cross_entropy(logits, labels),
            DistillationLossKind::MSE => {
                let probs = softmax_2d(logits);
                let diff = &probs - &one_hot(labels, logits.ncols());
                let count = diff.len().max(1) as f32;
                let loss = diff.iter().map(|d| d * d).sum::<f32>() / count;
                let grad_probs = diff * (2.0 / count);
                (loss, softmax_backward(&probs, &grad_probs))
            }
        }
    }

    fn teacher_term(&self, student: &Array2<f32>, teacher: &Array2<f32>) -> (f32, Array2<f32>) {
        let batch = student.nrows().max(1) as f32;
        let t = self.criterion.temperature;

        match self.criterion.loss_types[1] {
            DistillationLossKind::KL | DistillationLossKind::CE => {
                let student_soft = softmax_2d(&(student / t));
                let teacher_soft = softmax_2d(&(teacher / t));
                let raw = if self.criterion.loss_types[1] == DistillationLossKind::KL {
                    kl_divergence(&teacher_soft, &student_soft)
                } else {
                    soft_cross_entropy(&teacher_soft, &student_soft)
                };
                // T² · (1/T) · (p_s − p_t) / B
                let grad = (&student_soft - &teacher_soft) * (t / batch);
                (raw * t * t, grad)
            }
            DistillationLossKind::MSE => {
                let diff = student - teacher;
                let count = diff.len().max(1) as f32;
                let loss = diff.iter().map(|d| d * d).sum::<f32>() / count;
                (loss, diff * (2.0 / count))
            }
        }
    }
}

/// KL divergence between two probability distributions
///
/// KL(p || q) = Σ p_i * log(p_i / q_i)
///
/// Average over batch dimension.
fn kl_divergence(p: &Array2<f32>, q: &Array2<f32>) -> f32 {
    let mut total_kl = 0.0;

    for (p_row, q_row) in p.axis_iter(Axis(0)).zip(q.axis_iter(Axis(0))) {
        let mut kl = 0.0;
        for (&p_i, &q_i) in p_row.iter().zip(q_row.iter()) {
            if p_i > 1e-10 {
                kl += p_i * (p_i / q_i.max(1e-10)).ln();
            }
        }
        total_kl += kl;
    }

    total_kl / p.nrows().max(1) as f32
}

/// −Σ p_i log q_i, averaged over the batch
fn soft_cross_entropy(p: &Array2<f32>, q: &Array2<f32>) -> f32 {
    let total: f32 = p
        .iter()
        .zip(q.iter())
        .map(|(&p_i, &q_i)| -p_i * q_i.max(1e-10).ln())
        .sum();
    total / p.nrows().max(1) as f32
}
