//! Fake quantization operation with Straight-Through Estimator (STE).

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::config::FakeQuantConfig;

/// Fake quantization operation with Straight-Through Estimator (STE)
///
/// Holds the calibrated `scale` and `zero_point` used to snap values onto the
/// integer grid and back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FakeQuantize {
    /// Quantization configuration
    pub config: FakeQuantConfig,
    /// Scale factor for quantization
    pub scale: f32,
    /// Zero point for asymmetric quantization
    pub zero_point: i32,
    /// Whether scale has been initialized
    pub initialized: bool,
}

impl FakeQuantize {
    /// Create new fake quantization operation
    pub fn new(config: FakeQuantConfig) -> Self {
        Self { config, scale: 1.0, zero_point: 0, initialized: false }
    }

    /// Create with 8-bit symmetric quantization
    pub fn q8() -> Self {
        Self::new(FakeQuantConfig::q8_symmetric())
    }

    /// Initialize scale from data (min-max calibration)
    pub fn calibrate(&mut self, data: &[f32]) {
        if data.is_empty() {
            return;
        }
        let (min_val, max_val) = min_max(data.iter().copied());
        self.calibrate_range(min_val, max_val);
    }

    /// Initialize scale from an observed range
    ///
    /// For symmetric: scale = max(|min|, |max|) / qmax
    /// For asymmetric: scale = (max - min) / (qmax - qmin)
    pub fn calibrate_range(&mut self, min_val: f32, max_val: f32) {
        if self.config.symmetric {
            let max_abs = min_val.abs().max(max_val.abs());
            self.scale = max_abs / self.config.qmax as f32;
            self.zero_point = 0;
        } else {
            // The representable range must contain zero so padding stays exact
            let min_val = min_val.min(0.0);
            let max_val = max_val.max(0.0);
            self.scale = (max_val - min_val) / (self.config.qmax - self.config.qmin) as f32;
            if self.scale >= 1e-10 {
                self.zero_point = (self.config.qmin as f32 - min_val / self.scale).round() as i32;
                self.zero_point = self.zero_point.clamp(self.config.qmin, self.config.qmax);
            }
        }

        // Prevent division by zero
        if self.scale < 1e-10 {
            self.scale = 1e-10;
        }

        self.initialized = true;
    }

    /// Forward pass: fake quantize (quantize → dequantize)
    ///
    /// Output = dequantize(quantize(input)). Identity until calibrated.
    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        if !self.initialized {
            return input.clone();
        }
        input.mapv(|x| self.fake_quantize_value(x))
    }

    /// Forward pass with auto-calibration
    ///
    /// If not initialized, calibrates from input data first.
    pub fn forward_with_calibration(&mut self, input: &Array2<f32>) -> Array2<f32> {
        if !self.initialized {
            let (min_val, max_val) = min_max(input.iter().copied());
            self.calibrate_range(min_val, max_val);
        }
        self.forward(input)
    }

    /// Backward pass: Straight-Through Estimator (STE)
    ///
    /// ∂L/∂x = ∂L/∂y (where y = fake_quantize(x))
    pub fn backward(&self, grad_output: &Array2<f32>) -> Array2<f32> {
        grad_output.clone()
    }

    /// Integer code for a value
    pub fn quantize_value(&self, x: f32) -> i32 {
        let shifted = if self.config.symmetric {
            x / self.scale
        } else {
            x / self.scale + self.zero_point as f32
        };
        shifted
            .round()
            .clamp(self.config.qmin as f32, self.config.qmax as f32) as i32
    }

    /// Real value for an integer code
    pub fn dequantize_value(&self, q: i32) -> f32 {
        if self.config.symmetric {
            q as f32 * self.scale
        } else {
            (q - self.zero_point) as f32 * self.scale
        }
    }

    /// Fake quantize a single value
    pub fn fake_quantize_value(&self, x: f32) -> f32 {
        self.dequantize_value(self.quantize_value(x))
    }

    /// Get the quantization scale
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Get the zero point
    pub fn zero_point(&self) -> i32 {
        self.zero_point
    }

    /// Check if calibrated
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Get number of quantization levels
    pub fn num_levels(&self) -> usize {
        self.config.num_levels()
    }
}

pub(crate) fn min_max(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
