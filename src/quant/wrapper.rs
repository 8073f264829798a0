//! Quantized replacement for a linear layer

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::calibration::Calibrator;
use super::config::{QuantizationConfig, WeightGranularity};
use super::fake_quantize::{FakeQuantConfig, FakeQuantize};
use crate::model::{Linear, LinearCache, LinearGrad};

/// Linear layer wrapped with weight and input fake quantization.
///
/// The wrapped `module` keeps full-precision master weights (and any pruning
/// mask); every forward pass snaps the masked weights and the incoming
/// activations to the integer grid. Gradients flow straight through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedLinear {
    /// Wrapped full-precision layer
    pub module: Linear,
    weight_config: FakeQuantConfig,
    weight_granularity: WeightGranularity,
    input_fake_quant: FakeQuantize,
    input_observer: Calibrator,
    frozen: bool,
}

impl QuantizedLinear {
    /// Type name reported by [`crate::model::LayerModule::type_name`]
    pub const TYPE_NAME: &'static str = "quantized_linear";

    /// Wrap a linear layer according to `config`
    pub fn wrap(module: Linear, config: &QuantizationConfig) -> Self {
        let input_config = FakeQuantConfig::with_mode(config.bits(), config.activation_symmetric());
        Self {
            module,
            weight_config: FakeQuantConfig::with_mode(config.bits(), config.weight_symmetric()),
            weight_granularity: config.weight_granularity(),
            input_observer: Calibrator::new(config.observer().clone(), input_config.clone()),
            input_fake_quant: FakeQuantize::new(input_config),
            frozen: false,
        }
    }

    /// Feed a batch of inputs to the activation observer
    pub fn observe(&mut self, input: &Array2<f32>) {
        if self.frozen {
            return;
        }
        self.input_observer.observe(input.iter().copied());
        let result = self.input_observer.compute();
        self.input_fake_quant.calibrate_range(result.observed_min, result.observed_max);
    }

    /// Stop updating activation ranges
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether the activation range has been seeded
    pub fn is_calibrated(&self) -> bool {
        self.input_fake_quant.is_initialized()
    }

    /// Activation fake quantizer
    pub fn input_quantizer(&self) -> &FakeQuantize {
        &self.input_fake_quant
    }

    /// Weight quantizers for the current weights: one per row for
    /// per-channel granularity, a single one otherwise.
    pub fn weight_quantizers(&self) -> Vec<FakeQuantize> {
        let weight = self.module.effective_weight();
        match self.weight_granularity {
            WeightGranularity::PerTensor => {
                let mut fq = FakeQuantize::new(self.weight_config.clone());
                let (lo, hi) = super::fake_quantize::min_max(weight.iter().copied());
                fq.calibrate_range(lo, hi);
                vec![fq]
            }
            WeightGranularity::PerChannel => weight
                .axis_iter(Axis(0))
                .map(|row| {
                    let mut fq = FakeQuantize::new(self.weight_config.clone());
                    let (lo, hi) = super::fake_quantize::min_max(row.iter().copied());
                    fq.calibrate_range(lo, hi);
                    fq
                })
                .collect(),
        }
    }

    /// Masked weights snapped to the quantization grid
    pub fn fake_quantized_weight(&self) -> Array2<f32> {
        let quantizers = self.weight_quantizers();
        let mut weight = self.module.effective_weight();
        for (row_idx, mut row) in weight.axis_iter_mut(Axis(0)).enumerate() {
            let fq = &quantizers[row_idx.min(quantizers.len() - 1)];
            row.mapv_inplace(|w| fq.fake_quantize_value(w));
        }
        weight
    }

    /// Integer weight codes with their per-row (or single) scales
    pub fn integer_weights(&self) -> (Array2<i32>, Vec<f32>) {
        let quantizers = self.weight_quantizers();
        let weight = self.module.effective_weight();
        let codes = Array2::from_shape_fn(weight.dim(), |(r, c)| {
            quantizers[r.min(quantizers.len() - 1)].quantize_value(weight[[r, c]])
        });
        (codes, quantizers.iter().map(FakeQuantize::scale).collect())
    }

    /// Inference forward pass
    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        let input = self.input_fake_quant.forward(input);
        crate::model::affine(&input, &self.fake_quantized_weight(), &self.module.bias)
    }

    /// Training forward pass: updates the observer, then fake-quantizes
    pub fn forward_train(&mut self, input: &Array2<f32>) -> (Array2<f32>, LinearCache) {
        self.observe(input);
        let input = self.input_fake_quant.forward(input);
        let weight = self.fake_quantized_weight();
        let output = crate::model::affine(&input, &weight, &self.module.bias);
        (output, LinearCache { input, weight })
    }

    /// Backward pass through both fake quantizers (STE)
    pub fn backward(&self, cache: &LinearCache, grad_output: &Array2<f32>) -> (LinearGrad, Array2<f32>) {
        let (grad, grad_input) = self.module.backward(cache, grad_output);
        (grad, self.input_fake_quant.backward(&grad_input))
    }
}
