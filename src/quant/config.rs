//! Quantization-aware training configuration

use serde::{Deserialize, Serialize};

use super::calibration::CalibrationMethod;

/// Weight quantization granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightGranularity {
    /// One scale for the whole weight matrix
    PerTensor,
    /// One scale per output channel (row)
    #[default]
    PerChannel,
}

/// Configuration for quantization-aware training.
///
/// Target layers are wrapped in fake-quantized equivalents before the first
/// training step; activation ranges are seeded from calibration batches and
/// then tracked by a moving-average observer while training runs.
///
/// # Example
///
/// ```
/// use orquestar::quant::QuantizationConfig;
///
/// let config = QuantizationConfig::default().with_bits(8).with_calibration_batches(4);
/// assert!(config.requires_calibration());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationConfig {
    /// Bit width for weights and activations.
    bits: usize,
    /// Weight quantization is symmetric around zero.
    weight_symmetric: bool,
    /// Activation quantization is symmetric around zero.
    activation_symmetric: bool,
    /// Weight scale granularity.
    weight_granularity: WeightGranularity,
    /// Activation observer.
    observer: CalibrationMethod,
    /// Layers to wrap; empty means every linear layer.
    target_layers: Vec<String>,
    /// Whether activation ranges must be seeded from calibration data.
    requires_calibration: bool,
    /// Number of calibration batches to observe before training.
    calibration_batches: usize,
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            bits: 8,
            weight_symmetric: true,
            activation_symmetric: false,
            weight_granularity: WeightGranularity::default(),
            observer: CalibrationMethod::default(),
            target_layers: Vec::new(),
            requires_calibration: true,
            calibration_batches: 2,
        }
    }
}

impl QuantizationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    pub fn with_weight_symmetric(mut self, symmetric: bool) -> Self {
        self.weight_symmetric = symmetric;
        self
    }

    pub fn with_activation_symmetric(mut self, symmetric: bool) -> Self {
        self.activation_symmetric = symmetric;
        self
    }

    pub fn with_weight_granularity(mut self, granularity: WeightGranularity) -> Self {
        self.weight_granularity = granularity;
        self
    }

    pub fn with_observer(mut self, observer: CalibrationMethod) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_target_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires_calibration(mut self, required: bool) -> Self {
        self.requires_calibration = required;
        self
    }

    pub fn with_calibration_batches(mut self, batches: usize) -> Self {
        self.calibration_batches = batches;
        self
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn weight_symmetric(&self) -> bool {
        self.weight_symmetric
    }

    pub fn activation_symmetric(&self) -> bool {
        self.activation_symmetric
    }

    pub fn weight_granularity(&self) -> WeightGranularity {
        self.weight_granularity
    }

    pub fn observer(&self) -> &CalibrationMethod {
        &self.observer
    }

    /// Explicit target layers (empty means all linear layers)
    pub fn target_layers(&self) -> &[String] {
        &self.target_layers
    }

    pub fn requires_calibration(&self) -> bool {
        self.requires_calibration
    }

    pub fn calibration_batches(&self) -> usize {
        self.calibration_batches
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=8).contains(&self.bits) {
            return Err(format!("bits ({}) must be between 2 and 8", self.bits));
        }
        if let CalibrationMethod::MovingAverage { momentum } = self.observer {
            if !(momentum > 0.0 && momentum <= 1.0) {
                return Err(format!("observer momentum ({momentum}) must be in (0, 1]"));
            }
        }
        if self.requires_calibration && self.calibration_batches == 0 {
            return Err("calibration_batches must be > 0 when calibration is required".to_string());
        }
        Ok(())
    }
}
