//! Classification losses with analytic gradients

use ndarray::{Array2, Axis};

/// Compute softmax along last axis for 2D array
///
/// softmax(x)_i = exp(x_i) / Σ exp(x_j)
pub fn softmax_2d(x: &Array2<f32>) -> Array2<f32> {
    let mut result = x.clone();

    for mut row in result.axis_iter_mut(Axis(0)) {
        // Subtract max for numerical stability
        let max_val = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max_val).exp());

        let sum: f32 = row.sum();
        row.mapv_inplace(|v| v / sum);
    }

    result
}

/// One-hot encode labels into `[batch, num_classes]`
pub fn one_hot(labels: &[usize], num_classes: usize) -> Array2<f32> {
    let mut out = Array2::zeros((labels.len(), num_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label < num_classes {
            out[[row, label]] = 1.0;
        }
    }
    out
}

/// Mean cross-entropy against hard labels and its gradient w.r.t. the logits.
///
/// ∂L/∂z = (softmax(z) - onehot(y)) / B
pub fn cross_entropy(logits: &Array2<f32>, labels: &[usize]) -> (f32, Array2<f32>) {
    debug_assert_eq!(logits.nrows(), labels.len());
    let batch = labels.len().max(1) as f32;
    let probs = softmax_2d(logits);

    let loss = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs[[i, label]].max(1e-10).ln())
        .sum::<f32>()
        / batch;

    let grad = (&probs - &one_hot(labels, logits.ncols())) / batch;
    (loss, grad)
}

/// Backpropagate `grad_probs` through a row-wise softmax with outputs `probs`.
///
/// ∂L/∂z_i = p_i (g_i - Σ_j p_j g_j)
pub fn softmax_backward(probs: &Array2<f32>, grad_probs: &Array2<f32>) -> Array2<f32> {
    let dot = (probs * grad_probs).sum_axis(Axis(1)).insert_axis(Axis(1));
    probs * &(grad_probs - &dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_softmax_sums_to_one() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let probs = softmax_2d(&x);
        for row in probs.axis_iter(Axis(0)) {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_softmax_is_shift_invariant() {
        let a = softmax_2d(&array![[1.0, 2.0]]);
        let b = softmax_2d(&array![[1001.0, 1002.0]]);
        assert_relative_eq!(a[[0, 1]], b[[0, 1]], epsilon = 1e-6);
    }

    #[test]
    fn test_cross_entropy_uniform() {
        let (loss, grad) = cross_entropy(&array![[0.0, 0.0]], &[1]);
        assert_relative_eq!(loss, 2.0f32.ln(), epsilon = 1e-6);
        assert_relative_eq!(grad[[0, 0]], 0.5, epsilon = 1e-6);
        assert_relative_eq!(grad[[0, 1]], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_cross_entropy_gradient_matches_finite_difference() {
        let logits = array![[0.2, -1.0, 0.7], [1.5, 0.3, -0.2]];
        let labels = [2, 0];
        let (base, grad) = cross_entropy(&logits, &labels);
        let eps = 1e-3;
        let mut bumped = logits.clone();
        bumped[[1, 1]] += eps;
        let (moved, _) = cross_entropy(&bumped, &labels);
        assert_relative_eq!(grad[[1, 1]], (moved - base) / eps, epsilon = 1e-3);
    }

    #[test]
    fn test_softmax_backward_rows_sum_to_zero() {
        let probs = softmax_2d(&array![[0.1, 0.4, -0.3]]);
        let g = softmax_backward(&probs, &array![[1.0, -2.0, 0.5]]);
        assert_relative_eq!(g.sum(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(&[1, 0], 3), array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
    }
}
