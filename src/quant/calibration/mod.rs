//! Activation range calibration
//!
//! Observers that track the range of values flowing into a quantized layer
//! and turn it into a scale / zero point:
//! - Min-Max: Uses the full range of observed values
//! - Moving Average: Smooths the range over multiple batches (QAT default)

mod calibrator;
mod types;


pub use calibrator::Calibrator;
pub use types::{CalibrationMethod, CalibrationResult};
