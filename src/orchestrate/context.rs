//! Run inputs: datasets, teacher, metric and process-level settings

use serde::{Deserialize, Serialize};

use crate::data::{Batch, DataLoader, Dataset};
use crate::eval::Metric;
use crate::model::SequenceClassifier;

use super::error::OptimizationError;

/// Settings that would otherwise be process-wide globals.
///
/// Set once when the orchestrator is built and never changed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunEnvironment {
    /// Seeds batch shuffling
    pub seed: u64,
    /// Skip the progress reporter
    pub disable_external_reporting: bool,
}

impl Default for RunEnvironment {
    fn default() -> Self {
        Self { seed: 42, disable_external_reporting: false }
    }
}

impl RunEnvironment {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_external_reporting(mut self, enabled: bool) -> Self {
        self.disable_external_reporting = !enabled;
        self
    }
}

/// Data handles for one run plus a read-only borrow of the teacher.
///
/// The student is not held here: [`super::Orchestrator::optimize`] takes it
/// by value so nothing else can touch it while training runs.
#[derive(Debug, Clone)]
pub struct TrainingContext<'t> {
    pub train: Dataset,
    pub eval: Option<Dataset>,
    pub calibration: Option<Dataset>,
    pub metric: Option<Metric>,
    teacher: Option<&'t SequenceClassifier>,
}

impl<'t> TrainingContext<'t> {
    pub fn new(train: Dataset) -> Self {
        Self { train, eval: None, calibration: None, metric: None, teacher: None }
    }

    pub fn with_eval(mut self, eval: Dataset) -> Self {
        self.eval = Some(eval);
        self
    }

    pub fn with_calibration(mut self, calibration: Dataset) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_teacher(mut self, teacher: &'t SequenceClassifier) -> Self {
        self.teacher = Some(teacher);
        self
    }

    pub fn teacher(&self) -> Option<&'t SequenceClassifier> {
        self.teacher
    }

    /// Up to `limit` unshuffled calibration batches; empty when there is no
    /// calibration source.
    pub fn calibration_batches(&self, batch_size: usize, limit: usize) -> Result<Vec<Batch>, OptimizationError> {
        let Some(dataset) = &self.calibration else {
            return Ok(Vec::new());
        };
        let mut batches = DataLoader::new(dataset, batch_size)?.epoch(0);
        batches.truncate(limit);
        Ok(batches)
    }
}
