//! Loss computation for one training step

use ndarray::Array2;

use crate::data::Batch;
use crate::distill::Distiller;
use crate::train::loss::cross_entropy;

/// Loss values of one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct StepLoss {
    /// Value the gradient was taken of
    pub total: f32,
    /// Student-vs-label term
    pub task: f32,
    /// Student-vs-teacher term, when distilling
    pub distill: Option<f32>,
}

/// Combined loss and its gradient with respect to `logits`.
///
/// Without a distiller this is plain cross-entropy against the labels.
pub(crate) fn step_loss(
    distiller: Option<&mut Distiller<'_>>,
    batch: &Batch,
    logits: &Array2<f32>,
) -> (StepLoss, Array2<f32>) {
    match distiller {
        Some(distiller) => {
            let out = distiller.forward(batch, logits);
            let loss = StepLoss { total: out.total, task: out.student_loss, distill: Some(out.distill_loss) };
            (loss, out.grad)
        }
        None => {
            let (loss, grad) = cross_entropy(logits, &batch.labels);
            (StepLoss { total: loss, task: loss, distill: None }, grad)
        }
    }
}
