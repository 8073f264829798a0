//! Dense layer with an optional pruning mask

use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Values at or below this magnitude count as pruned.
pub const NEAR_ZERO: f32 = 1e-8;

/// Fully connected layer: `y = x · Wᵀ + b`
///
/// Weights are stored `[out_features, in_features]`. When a mask is attached,
/// masked-out weights are held at exactly zero after every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    /// Weight matrix `[out, in]`
    pub weight: Array2<f32>,
    /// Bias vector `[out]`
    pub bias: Array1<f32>,
    /// Pruning mask (1.0 keeps, 0.0 prunes), same shape as `weight`
    mask: Option<Array2<f32>>,
}

/// Activations retained from a training forward pass
#[derive(Debug, Clone)]
pub struct LinearCache {
    /// Input actually multiplied (after any fake quantization)
    pub input: Array2<f32>,
    /// Weight actually multiplied (after masking and fake quantization)
    pub weight: Array2<f32>,
}

/// Gradients for one linear layer
#[derive(Debug, Clone)]
pub struct LinearGrad {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    /// Uniform init in `±1/sqrt(in_features)`
    pub fn init<R: Rng>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        let weight =
            Array2::from_shape_fn((out_features, in_features), |_| rng.random_range(-bound..bound));
        Self { weight, bias: Array1::zeros(out_features), mask: None }
    }

    /// Build from explicit parameters
    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Self {
        Self { weight, bias, mask: None }
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn num_params(&self) -> usize {
        self.weight.len() + self.bias.len()
    }

    pub fn mask(&self) -> Option<&Array2<f32>> {
        self.mask.as_ref()
    }

    /// Attach a mask and zero the weights it removes.
    pub fn set_mask(&mut self, mask: Array2<f32>) {
        debug_assert_eq!(mask.dim(), self.weight.dim());
        self.mask = Some(mask);
        self.apply_mask();
    }

    /// Re-zero masked weights (called after each optimizer step).
    pub fn apply_mask(&mut self) {
        if let Some(mask) = &self.mask {
            self.weight *= mask;
        }
    }

    /// Weight with the mask applied
    pub fn effective_weight(&self) -> Array2<f32> {
        match &self.mask {
            Some(mask) => &self.weight * mask,
            None => self.weight.clone(),
        }
    }

    /// Fraction of weights whose magnitude is at or below [`NEAR_ZERO`]
    pub fn sparsity(&self) -> f32 {
        if self.weight.is_empty() {
            return 0.0;
        }
        let zeros = self.weight.iter().filter(|w| w.abs() <= NEAR_ZERO).count();
        zeros as f32 / self.weight.len() as f32
    }

    /// Inference forward pass
    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        affine(input, &self.effective_weight(), &self.bias)
    }

    /// Forward pass that keeps what backward needs
    pub fn forward_train(&self, input: &Array2<f32>) -> (Array2<f32>, LinearCache) {
        let weight = self.effective_weight();
        let output = affine(input, &weight, &self.bias);
        (output, LinearCache { input: input.clone(), weight })
    }

    /// Backward pass. Returns parameter gradients and the gradient w.r.t. the input.
    ///
    /// Masked positions receive zero gradient.
    pub fn backward(&self, cache: &LinearCache, grad_output: &Array2<f32>) -> (LinearGrad, Array2<f32>) {
        let mut grad_weight = grad_output.t().dot(&cache.input);
        if let Some(mask) = &self.mask {
            grad_weight *= mask;
        }
        let grad_bias = grad_output.sum_axis(Axis(0));
        let grad_input = grad_output.dot(&cache.weight);
        (LinearGrad { weight: grad_weight, bias: grad_bias }, grad_input)
    }
}

/// `x · Wᵀ + b` with bias broadcast over the batch
pub(crate) fn affine(input: &Array2<f32>, weight: &Array2<f32>, bias: &Array1<f32>) -> Array2<f32> {
    input.dot(&weight.t()) + bias
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer() -> Linear {
        Linear::from_parts(array![[1.0, 2.0], [3.0, 4.0], [0.5, -1.0]], array![0.1, 0.2, 0.3])
    }

    #[test]
    fn test_forward_shape_and_values() {
        let l = layer();
        let x = array![[1.0, 1.0]];
        let y = l.forward(&x);
        assert_eq!(y.dim(), (1, 3));
        assert_relative_eq!(y[[0, 0]], 3.1, epsilon = 1e-6);
        assert_relative_eq!(y[[0, 1]], 7.2, epsilon = 1e-6);
        assert_relative_eq!(y[[0, 2]], -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_mask_zeroes_weights_and_gradients() {
        let mut l = layer();
        l.set_mask(array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
        assert_eq!(l.weight[[0, 0]], 0.0);
        assert_eq!(l.weight[[1, 1]], 0.0);
        assert_relative_eq!(l.sparsity(), 2.0 / 6.0, epsilon = 1e-6);

        let x = array![[1.0, -2.0]];
        let (_, cache) = l.forward_train(&x);
        let (grad, _) = l.backward(&cache, &array![[1.0, 1.0, 1.0]]);
        assert_eq!(grad.weight[[0, 0]], 0.0);
        assert_eq!(grad.weight[[1, 1]], 0.0);
        assert_relative_eq!(grad.weight[[2, 1]], -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let l = layer();
        let x = array![[0.3, -0.7], [1.2, 0.4]];
        let (_, cache) = l.forward_train(&x);
        // Loss = sum of outputs, so dL/dy = 1
        let ones = Array2::ones((2, 3));
        let (grad, grad_input) = l.backward(&cache, &ones);

        let eps = 1e-3;
        let mut bumped = l.clone();
        bumped.weight[[1, 0]] += eps;
        let numeric = (bumped.forward(&x).sum() - l.forward(&x).sum()) / eps;
        assert_relative_eq!(grad.weight[[1, 0]], numeric, epsilon = 1e-2);
        assert_relative_eq!(grad.bias[0], 2.0, epsilon = 1e-6);
        assert_eq!(grad_input.dim(), (2, 2));
    }

    #[test]
    fn test_init_is_seeded() {
        let a = Linear::init(4, 3, &mut StdRng::seed_from_u64(7));
        let b = Linear::init(4, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_eq!(a.num_params(), 15);
    }
}
