//! Quantization-aware training pass

use tracing::{debug, info, warn};

use crate::config::Technique;
use crate::model::SequenceClassifier;
use crate::orchestrate::{AppliedTechnique, CompressionCallback, OptimizationError, PassContext, StepInfo};

use super::config::QuantizationConfig;

/// Wraps target layers in [`super::QuantizedLinear`] before training,
/// seeds their activation observers from calibration batches and freezes
/// the observed ranges once training ends.
#[derive(Debug, Clone)]
pub struct QuantizationCallback {
    config: QuantizationConfig,
    layers: Vec<String>,
    calibrated_batches: usize,
}

impl QuantizationCallback {
    pub fn new(config: QuantizationConfig) -> Self {
        Self { config, layers: Vec::new(), calibrated_batches: 0 }
    }

    pub fn config(&self) -> &QuantizationConfig {
        &self.config
    }

    /// Layers wrapped at train begin
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn calibrated_batches(&self) -> usize {
        self.calibrated_batches
    }

    fn resolve_layers(&self, model: &SequenceClassifier) -> Vec<String> {
        if self.config.target_layers().is_empty() {
            model.layer_names().iter().map(|s| s.to_string()).collect()
        } else {
            self.config.target_layers().to_vec()
        }
    }
}

impl CompressionCallback for QuantizationCallback {
    fn technique(&self) -> Technique {
        Technique::Quantization
    }

    fn on_train_begin(
        &mut self,
        model: &mut SequenceClassifier,
        ctx: &PassContext<'_>,
    ) -> Result<(), OptimizationError> {
        self.layers = self.resolve_layers(model);
        for name in &self.layers {
            let layer = model.layer_mut(name).ok_or_else(|| OptimizationError::TechniqueNotApplied {
                technique: Technique::Quantization,
                reason: format!("unknown layer {name}"),
            })?;
            layer.quantize(&self.config);
        }

        if self.config.requires_calibration() {
            if ctx.calibration.is_empty() {
                return Err(OptimizationError::MissingCalibrationData);
            }
            for batch in ctx.calibration.iter().take(self.config.calibration_batches()) {
                model.forward_train(batch);
                self.calibrated_batches += 1;
            }
            debug!(batches = self.calibrated_batches, "calibrated activation ranges");
        } else if !ctx.calibration.is_empty() {
            warn!("calibration batches supplied but calibration is disabled; ranges come from training data");
        }

        info!(bits = self.config.bits(), layers = ?self.layers, "quantization-aware training enabled");
        Ok(())
    }

    fn on_train_end(&mut self, model: &mut SequenceClassifier, _step: &StepInfo) -> Result<(), OptimizationError> {
        for name in &self.layers {
            if let Some(q) = model.layer_mut(name).and_then(|l| l.as_quantized_mut()) {
                q.freeze();
            }
        }
        Ok(())
    }

    fn verify(&self, model: &SequenceClassifier, _tolerance: f32) -> Result<AppliedTechnique, OptimizationError> {
        let not_applied = |reason: String| OptimizationError::TechniqueNotApplied {
            technique: Technique::Quantization,
            reason,
        };
        if self.layers.is_empty() {
            return Err(not_applied("no layers were wrapped".to_string()));
        }
        for name in &self.layers {
            let layer = model.layer(name).ok_or_else(|| not_applied(format!("unknown layer {name}")))?;
            let Some(q) = layer.as_quantized() else {
                return Err(not_applied(format!("layer {name} is {}", layer.type_name())));
            };
            if !q.is_calibrated() {
                return Err(not_applied(format!("layer {name} has no activation range")));
            }
        }

        Ok(AppliedTechnique {
            technique: Technique::Quantization,
            layers: self.layers.clone(),
            detail: format!(
                "int{} fake quantization ({} calibration batches)",
                self.config.bits(),
                self.calibrated_batches
            ),
        })
    }

    fn name(&self) -> &'static str {
        "QuantizationCallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Batch, DataLoader, Dataset, HashingTokenizer, TokenizerOptions};
    use crate::model::{ModelConfig, CLASSIFIER, PRE_CLASSIFIER};
    use crate::quant::QuantizedLinear;

    fn model() -> SequenceClassifier {
        SequenceClassifier::new(
            ModelConfig::default().with_vocab_size(64).with_embed_dim(8).with_hidden_size(8),
            1,
        )
        .unwrap()
    }

    fn batches() -> Vec<Batch> {
        let ds = Dataset::from_texts(
            [("good film", 1), ("bad film", 0), ("fine", 1)],
            &HashingTokenizer::new(64),
            &TokenizerOptions::default(),
        )
        .unwrap();
        DataLoader::new(&ds, 2).unwrap().epoch(0)
    }

    #[test]
    fn test_wraps_every_linear_layer_by_default() {
        let mut m = model();
        let calibration = batches();
        let mut callback = QuantizationCallback::new(QuantizationConfig::default());
        callback
            .on_train_begin(&mut m, &PassContext { calibration: &calibration, total_steps: 4 })
            .unwrap();

        assert_eq!(m.classifier().type_name(), QuantizedLinear::TYPE_NAME);
        assert!(m.classifier().type_name().contains("quantize"));
        assert!(m.pre_classifier().is_quantized());
        assert_eq!(callback.calibrated_batches(), 2);

        let applied = callback.verify(&m, 0.0).unwrap();
        assert_eq!(applied.technique, Technique::Quantization);
        assert_eq!(applied.layers, vec![PRE_CLASSIFIER.to_string(), CLASSIFIER.to_string()]);
    }

    #[test]
    fn test_target_layers_limit_wrapping() {
        let mut m = model();
        let calibration = batches();
        let mut callback =
            QuantizationCallback::new(QuantizationConfig::default().with_target_layers([CLASSIFIER]));
        callback
            .on_train_begin(&mut m, &PassContext { calibration: &calibration, total_steps: 4 })
            .unwrap();
        assert!(m.classifier().is_quantized());
        assert!(!m.pre_classifier().is_quantized());
    }

    #[test]
    fn test_missing_calibration_data_fails() {
        let mut m = model();
        let mut callback = QuantizationCallback::new(QuantizationConfig::default());
        let err = callback.on_train_begin(&mut m, &PassContext::default()).unwrap_err();
        assert!(matches!(err, OptimizationError::MissingCalibrationData));
    }

    #[test]
    fn test_calibration_optional() {
        let mut m = model();
        let mut callback =
            QuantizationCallback::new(QuantizationConfig::default().with_requires_calibration(false));
        callback.on_train_begin(&mut m, &PassContext::default()).unwrap();
        // Wrapped but never observed anything
        assert!(m.classifier().is_quantized());
        assert!(callback.verify(&m, 0.0).is_err());

        for batch in batches() {
            m.forward_train(&batch);
        }
        assert!(callback.verify(&m, 0.0).is_ok());
    }

    #[test]
    fn test_train_end_freezes_observers() {
        let mut m = model();
        let calibration = batches();
        let mut callback = QuantizationCallback::new(QuantizationConfig::default());
        callback
            .on_train_begin(&mut m, &PassContext { calibration: &calibration, total_steps: 4 })
            .unwrap();
        callback.on_train_end(&mut m, &StepInfo::default()).unwrap();
        assert!(m.classifier().as_quantized().unwrap().is_frozen());
    }

    #[test]
    fn test_verify_detects_unwrapped_layer() {
        let mut m = model();
        let calibration = batches();
        let mut callback = QuantizationCallback::new(QuantizationConfig::default());
        callback
            .on_train_begin(&mut m, &PassContext { calibration: &calibration, total_steps: 4 })
            .unwrap();

        let fresh = model();
        let err = callback.verify(&fresh, 0.0).unwrap_err();
        assert!(matches!(
            err,
            OptimizationError::TechniqueNotApplied { technique: Technique::Quantization, .. }
        ));
    }
}
