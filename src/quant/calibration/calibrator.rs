//! Running-range observer

use serde::{Deserialize, Serialize};

use super::types::{CalibrationMethod, CalibrationResult};
use crate::quant::fake_quantize::FakeQuantConfig;

/// Observer collecting value ranges and computing quantization parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibrator {
    /// Calibration method
    method: CalibrationMethod,
    /// Target quantization grid
    config: FakeQuantConfig,
    /// Running minimum
    running_min: Option<f32>,
    /// Running maximum
    running_max: Option<f32>,
    /// Number of batches observed
    num_batches: usize,
}

impl Calibrator {
    /// Create a calibrator for the given grid
    pub fn new(method: CalibrationMethod, config: FakeQuantConfig) -> Self {
        Self { method, config, running_min: None, running_max: None, num_batches: 0 }
    }

    /// Create new calibrator with min-max method
    pub fn min_max(bits: usize, symmetric: bool) -> Self {
        Self::new(CalibrationMethod::MinMax, FakeQuantConfig::with_mode(bits, symmetric))
    }

    /// Create new calibrator with moving average method
    pub fn moving_average(bits: usize, symmetric: bool, momentum: f32) -> Self {
        Self::new(
            CalibrationMethod::MovingAverage { momentum },
            FakeQuantConfig::with_mode(bits, symmetric),
        )
    }

    /// Observe a batch of data for calibration
    pub fn observe<I>(&mut self, data: I)
    where
        I: IntoIterator<Item = f32>,
    {
        let mut iter = data.into_iter().peekable();
        if iter.peek().is_none() {
            return;
        }
        let (batch_min, batch_max) = crate::quant::fake_quantize::min_max(iter);

        match &self.method {
            CalibrationMethod::MinMax => {
                self.running_min = Some(self.running_min.map_or(batch_min, |m| m.min(batch_min)));
                self.running_max = Some(self.running_max.map_or(batch_max, |m| m.max(batch_max)));
            }
            CalibrationMethod::MovingAverage { momentum } => {
                let momentum = *momentum;
                self.running_min = Some(
                    self.running_min
                        .map_or(batch_min, |m| m * (1.0 - momentum) + batch_min * momentum),
                );
                self.running_max = Some(
                    self.running_max
                        .map_or(batch_max, |m| m * (1.0 - momentum) + batch_max * momentum),
                );
            }
        }

        self.num_batches += 1;
    }

    /// Compute calibration result
    pub fn compute(&self) -> CalibrationResult {
        let observed_min = self.running_min.unwrap_or(0.0);
        let observed_max = self.running_max.unwrap_or(0.0);
        let mut fq = crate::quant::FakeQuantize::new(self.config.clone());
        fq.calibrate_range(observed_min, observed_max);

        CalibrationResult { scale: fq.scale, zero_point: fq.zero_point, observed_min, observed_max }
    }

    /// Get number of batches observed
    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    /// Get calibration method
    pub fn method(&self) -> &CalibrationMethod {
        &self.method
    }

    /// Check if any data has been observed
    pub fn has_data(&self) -> bool {
        self.num_batches > 0
    }

    /// Reset calibration state
    pub fn reset(&mut self) {
        self.running_min = None;
        self.running_max = None;
        self.num_batches = 0;
    }
}
