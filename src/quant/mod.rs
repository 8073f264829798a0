//! Quantization-aware training
//!
//! - Fake quantization with STE for QAT
//! - Activation range observers (min-max, moving average)
//! - [`QuantizedLinear`]: the wrapper that replaces a linear layer
//! - [`QuantizationCallback`]: wraps and calibrates layers inside the combined loop

mod calibration;
mod callback;
mod config;
mod fake_quantize;
mod wrapper;

pub use calibration::{CalibrationMethod, CalibrationResult, Calibrator};
pub use callback::QuantizationCallback;
pub use config::{QuantizationConfig, WeightGranularity};
pub use fake_quantize::{FakeQuantConfig, FakeQuantize};
pub use wrapper::QuantizedLinear;
