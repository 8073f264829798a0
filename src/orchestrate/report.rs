//! Run results

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Technique;
use crate::eval::{EvalReport, Metric, MetricComparison};
use crate::model::{ModelError, SequenceClassifier};

/// Evidence that one technique is present in the final model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedTechnique {
    pub technique: Technique,
    /// Layers carrying the technique's structure; empty for loss-only techniques
    pub layers: Vec<String>,
    pub detail: String,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Applied techniques in composition order
    pub techniques: Vec<AppliedTechnique>,
    /// Near-zero weight fraction per linear layer
    pub sparsity: Vec<(String, f32)>,
    /// Combined loss per step
    pub loss_history: Vec<f32>,
    pub steps: usize,
    pub epochs_completed: usize,
    /// A trainer callback asked to stop before the configured epochs ran out
    pub stopped_early: bool,
    pub checkpoints: Vec<PathBuf>,
    /// Final evaluation, when an eval set was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval: Option<EvalReport>,
    /// Evaluation of the untouched student, taken when a metric was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_eval: Option<EvalReport>,
}

impl OptimizationReport {
    pub fn applied(&self, technique: Technique) -> Option<&AppliedTechnique> {
        self.techniques.iter().find(|t| t.technique == technique)
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.loss_history.last().copied()
    }

    /// Compare the final evaluation against the baseline under `metric`
    pub fn compare(&self, metric: &Metric) -> Option<MetricComparison> {
        let baseline = metric.value(self.baseline_eval.as_ref()?)?;
        let candidate = metric.value(self.eval.as_ref()?)?;
        Some(metric.compare(baseline, candidate))
    }
}

/// The student after a successful run, with its report
#[derive(Debug, Clone)]
pub struct OptimizedModel {
    model: SequenceClassifier,
    report: OptimizationReport,
}

impl OptimizedModel {
    pub(crate) fn new(model: SequenceClassifier, report: OptimizationReport) -> Self {
        Self { model, report }
    }

    pub fn model(&self) -> &SequenceClassifier {
        &self.model
    }

    pub fn report(&self) -> &OptimizationReport {
        &self.report
    }

    pub fn into_model(self) -> SequenceClassifier {
        self.model
    }

    pub fn into_parts(self) -> (SequenceClassifier, OptimizationReport) {
        (self.model, self.report)
    }

    /// Save the model plus `optimization_report.json` into `dir`
    pub fn save_pretrained(&self, dir: impl AsRef<Path>) -> Result<(), ModelError> {
        let dir = dir.as_ref();
        self.model.save_pretrained(dir)?;
        let path = dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(&self.report)
            .map_err(|e| ModelError::ConfigParse { path: path.clone(), message: e.to_string() })?;
        std::fs::write(&path, json).map_err(|source| ModelError::Io { path, source })
    }
}

/// Report file written next to a saved optimized model
pub const REPORT_FILE: &str = "optimization_report.json";
