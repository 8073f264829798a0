//! Scoring a classifier on a held-out dataset

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::{DataLoader, Dataset};
use crate::model::SequenceClassifier;
use crate::orchestrate::OptimizationError;
use crate::train::loss::cross_entropy;

/// Loss and accuracy over an evaluation set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub eval_loss: f32,
    pub eval_accuracy: f32,
    pub num_examples: usize,
}

/// Index of the largest value in each row; ties resolve to the first.
pub fn argmax_rows(logits: &Array2<f32>) -> Vec<usize> {
    logits
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                    if v > best_v {
                        (i, v)
                    } else {
                        (best_i, best_v)
                    }
                })
                .0
        })
        .collect()
}

/// Fraction of predictions equal to their label.
///
/// Returns 0.0 for empty input.
pub fn accuracy(predictions: &[usize], labels: &[usize]) -> f32 {
    let n = predictions.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }
    let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
    correct as f32 / n as f32
}

/// Run the model over `dataset` in inference mode.
pub fn evaluate(
    model: &SequenceClassifier,
    dataset: &Dataset,
    batch_size: usize,
) -> Result<EvalReport, OptimizationError> {
    if dataset.is_empty() {
        return Err(OptimizationError::EmptyDataset);
    }
    let loader = DataLoader::new(dataset, batch_size)?;

    let mut loss_sum = 0.0;
    let mut predictions = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());
    for batch in loader.epoch(0) {
        let logits = model.forward(&batch);
        let (loss, _) = cross_entropy(&logits, &batch.labels);
        loss_sum += loss * batch.len() as f32;
        predictions.extend(argmax_rows(&logits));
        labels.extend_from_slice(&batch.labels);
    }

    Ok(EvalReport {
        eval_loss: loss_sum / dataset.len() as f32,
        eval_accuracy: accuracy(&predictions, &labels),
        num_examples: dataset.len(),
    })
}
