//! Loading the models and datasets a run spec names

use crate::config::{CalibrationSource, RunSpec};
use crate::data::{Dataset, HashingTokenizer};
use crate::eval::Metric;
use crate::model::{ModelHub, SequenceClassifier};
use crate::orchestrate::TrainingContext;

/// Everything a run spec resolves to
pub(crate) struct PreparedRun {
    pub spec: RunSpec,
    pub student: SequenceClassifier,
    pub teacher: Option<SequenceClassifier>,
    pub data: RunData,
}

pub(crate) struct RunData {
    pub train: Dataset,
    pub eval: Dataset,
    pub calibration: Option<Dataset>,
}

impl RunData {
    pub fn into_context<'t>(self, metric: Option<Metric>, teacher: Option<&'t SequenceClassifier>) -> TrainingContext<'t> {
        let mut ctx = TrainingContext::new(self.train).with_eval(self.eval);
        if let Some(calibration) = self.calibration {
            ctx = ctx.with_calibration(calibration);
        }
        if let Some(metric) = metric {
            ctx = ctx.with_metric(metric);
        }
        if let Some(teacher) = teacher {
            ctx = ctx.with_teacher(teacher);
        }
        ctx
    }
}

/// Load student, teacher and datasets.
///
/// Texts are tokenized with a hashing tokenizer sized to the student's
/// vocabulary. Without an explicit eval file the training split doubles as
/// the eval split.
pub(crate) fn prepare(spec: RunSpec) -> crate::Result<PreparedRun> {
    let hub = ModelHub::new(&spec.hub_root);
    let student = hub.load(&spec.model)?;
    let teacher = spec.teacher_identifier().map(|id| hub.load(id)).transpose()?;

    let tokenizer = HashingTokenizer::new(student.config().vocab_size);
    let mut train = Dataset::from_jsonl(&spec.dataset.path, &tokenizer, &spec.tokenizer)?;
    if let Some(n) = spec.dataset.select {
        train = train.select(0..n)?;
    }
    let eval = match &spec.dataset.eval_path {
        Some(path) => Dataset::from_jsonl(path, &tokenizer, &spec.tokenizer)?,
        None => train.clone(),
    };
    let calibration = match &spec.dataset.calibration {
        CalibrationSource::Train => Some(train.clone()),
        CalibrationSource::Eval => Some(eval.clone()),
        CalibrationSource::File(path) => Some(Dataset::from_jsonl(path, &tokenizer, &spec.tokenizer)?),
        CalibrationSource::Disabled => None,
    };

    Ok(PreparedRun { spec, student, teacher, data: RunData { train, eval, calibration } })
}
