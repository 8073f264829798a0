//! Acceptance criterion for an optimized model

use serde::{Deserialize, Serialize};

use super::evaluator::EvalReport;

/// A named metric and the tolerance allowed when comparing a candidate
/// model against its baseline.
///
/// Relative mode measures the degradation as a fraction of the baseline;
/// absolute mode uses the raw difference. Either way the candidate is
/// accepted when the degradation is at most `criterion`.
///
/// # Example
///
/// ```
/// use orquestar::eval::Metric;
///
/// let metric = Metric::new("eval_accuracy", true, 0.5);
/// assert!(metric.accepts(0.9, 0.5));
/// assert!(!metric.accepts(0.9, 0.4));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub is_relative: bool,
    pub criterion: f32,
    #[serde(default = "default_true")]
    pub greater_is_better: bool,
}

fn default_true() -> bool {
    true
}

/// Outcome of comparing a candidate value against a baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricComparison {
    pub baseline: f32,
    pub candidate: f32,
    /// Degradation in the metric's own direction; negative means improvement
    pub degradation: f32,
    pub accepted: bool,
}

impl Metric {
    pub fn new(name: impl Into<String>, is_relative: bool, criterion: f32) -> Self {
        Self { name: name.into(), is_relative, criterion, greater_is_better: true }
    }

    pub fn with_greater_is_better(mut self, greater_is_better: bool) -> Self {
        self.greater_is_better = greater_is_better;
        self
    }

    pub fn compare(&self, baseline: f32, candidate: f32) -> MetricComparison {
        let raw = if self.greater_is_better { baseline - candidate } else { candidate - baseline };
        let degradation = if self.is_relative {
            if baseline.abs() <= f32::EPSILON {
                // Any drop from a zero baseline is unbounded
                if raw > 0.0 {
                    f32::INFINITY
                } else {
                    0.0
                }
            } else {
                raw / baseline.abs()
            }
        } else {
            raw
        };
        MetricComparison {
            baseline,
            candidate,
            degradation,
            accepted: degradation.is_finite() && degradation <= self.criterion,
        }
    }

    /// Whether `candidate` is within the tolerated degradation of `baseline`
    pub fn accepts(&self, baseline: f32, candidate: f32) -> bool {
        self.compare(baseline, candidate).accepted
    }

    /// Read this metric's value from an evaluation report.
    ///
    /// Names follow the `eval_` prefix convention; the bare names are
    /// accepted too.
    pub fn value(&self, report: &EvalReport) -> Option<f32> {
        match self.name.trim_start_matches("eval_") {
            "accuracy" => Some(report.eval_accuracy),
            "loss" => Some(report.eval_loss),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("metric name must not be empty".to_string());
        }
        if !(self.criterion.is_finite() && self.criterion >= 0.0) {
            return Err(format!("metric criterion must be >= 0 (got {})", self.criterion));
        }
        if !matches!(self.name.trim_start_matches("eval_"), "accuracy" | "loss") {
            return Err(format!("unknown metric {}", self.name));
        }
        Ok(())
    }
}
