//! Type definitions for range calibration

use serde::{Deserialize, Serialize};

/// How an observer folds new batches into its running range
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalibrationMethod {
    /// Min-max calibration: scale from actual min/max values
    MinMax,
    /// Moving average: smoothed min/max over multiple batches
    MovingAverage {
        /// Smoothing factor (0 = no smoothing, 1 = fully use new value)
        momentum: f32,
    },
}

impl Default for CalibrationMethod {
    fn default() -> Self {
        CalibrationMethod::MovingAverage { momentum: 0.1 }
    }
}

/// Calibration result containing scale and zero_point
#[derive(Clone, Debug)]
pub struct CalibrationResult {
    /// Scale factor for quantization
    pub scale: f32,
    /// Zero point for asymmetric quantization
    pub zero_point: i32,
    /// Observed minimum value
    pub observed_min: f32,
    /// Observed maximum value
    pub observed_max: f32,
}
