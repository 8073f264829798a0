//! Swappable layer slot

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::linear::{Linear, LinearCache, LinearGrad};
use crate::quant::{QuantizationConfig, QuantizedLinear};

/// A named layer position that holds either a plain or a quantized linear layer.
///
/// Quantization-aware training replaces the slot content in place; pruning
/// masks live on the inner [`Linear`] and survive the swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerModule {
    Linear(Linear),
    Quantized(QuantizedLinear),
}

impl LayerModule {
    /// Type name of the module currently in the slot
    pub fn type_name(&self) -> &'static str {
        match self {
            LayerModule::Linear(_) => "linear",
            LayerModule::Quantized(_) => QuantizedLinear::TYPE_NAME,
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, LayerModule::Quantized(_))
    }

    /// Full-precision layer (the wrapped one when quantized)
    pub fn linear(&self) -> &Linear {
        match self {
            LayerModule::Linear(linear) => linear,
            LayerModule::Quantized(q) => &q.module,
        }
    }

    pub fn linear_mut(&mut self) -> &mut Linear {
        match self {
            LayerModule::Linear(linear) => linear,
            LayerModule::Quantized(q) => &mut q.module,
        }
    }

    pub fn as_quantized(&self) -> Option<&QuantizedLinear> {
        match self {
            LayerModule::Quantized(q) => Some(q),
            LayerModule::Linear(_) => None,
        }
    }

    pub fn as_quantized_mut(&mut self) -> Option<&mut QuantizedLinear> {
        match self {
            LayerModule::Quantized(q) => Some(q),
            LayerModule::Linear(_) => None,
        }
    }

    /// Replace a plain linear layer with its quantized wrapper.
    ///
    /// Already-quantized slots are left untouched.
    pub fn quantize(&mut self, config: &QuantizationConfig) {
        if let LayerModule::Linear(linear) = self {
            let placeholder = Linear::from_parts(Array2::zeros((0, 0)), Array1::zeros(0));
            let module = std::mem::replace(linear, placeholder);
            *self = LayerModule::Quantized(QuantizedLinear::wrap(module, config));
        }
    }

    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        match self {
            LayerModule::Linear(linear) => linear.forward(input),
            LayerModule::Quantized(q) => q.forward(input),
        }
    }

    pub fn forward_train(&mut self, input: &Array2<f32>) -> (Array2<f32>, LinearCache) {
        match self {
            LayerModule::Linear(linear) => linear.forward_train(input),
            LayerModule::Quantized(q) => q.forward_train(input),
        }
    }

    pub fn backward(&self, cache: &LinearCache, grad_output: &Array2<f32>) -> (LinearGrad, Array2<f32>) {
        match self {
            LayerModule::Linear(linear) => linear.backward(cache, grad_output),
            LayerModule::Quantized(q) => q.backward(cache, grad_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_quantize_swaps_slot_and_keeps_mask() {
        let mut linear = Linear::from_parts(array![[1.0, 2.0]], array![0.0]);
        linear.set_mask(array![[1.0, 0.0]]);
        let mut slot = LayerModule::Linear(linear);
        assert_eq!(slot.type_name(), "linear");

        slot.quantize(&QuantizationConfig::default());
        assert!(slot.is_quantized());
        assert!(slot.type_name().contains("quantize"));
        assert!(slot.linear().mask().is_some());
        assert_eq!(slot.linear().weight[[0, 1]], 0.0);
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let mut slot = LayerModule::Linear(Linear::from_parts(array![[1.0]], array![0.0]));
        slot.quantize(&QuantizationConfig::default());
        let once = slot.clone();
        slot.quantize(&QuantizationConfig::default().with_bits(4));
        assert_eq!(slot, once);
    }
}
