//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_spec, RunSpec, ValidateArgs};

use super::prepare::{prepare, PreparedRun};

/// Format the model section of a run spec
pub fn format_model_info(spec: &RunSpec) -> String {
    let mut lines = vec![format!("  Student: {} (hub {})", spec.model, spec.hub_root.display())];
    if let Some(teacher) = spec.teacher_identifier() {
        lines.push(format!("  Teacher: {teacher}"));
    }
    lines.join("\n")
}

/// Format the dataset section of a run spec
pub fn format_data_info(spec: &RunSpec) -> String {
    let mut lines = vec![format!("  Training data: {}", spec.dataset.path.display())];
    if let Some(n) = spec.dataset.select {
        lines.push(format!("  Select: first {n} examples"));
    }
    if let Some(eval) = &spec.dataset.eval_path {
        lines.push(format!("  Eval data: {}", eval.display()));
    }
    lines.push(format!("  Calibration: {:?}", spec.dataset.calibration));
    lines.push(format!("  Batch size: {}", spec.training.batch_size));
    lines.join("\n")
}

/// Format the optimizations of a run spec
pub fn format_optimizations(spec: &RunSpec) -> String {
    spec.optimizations
        .ordered()
        .iter()
        .map(|c| format!("  - {}", c.technique()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating run spec: {}", args.spec.display()));

    let spec = load_spec(&args.spec).map_err(|e| e.to_string())?;
    let PreparedRun { spec, student, teacher, data } = prepare(spec).map_err(|e| e.to_string())?;
    let ctx = data.into_context(spec.metric.clone(), teacher.as_ref());
    spec.optimizations
        .validate(&ctx, &student, &spec.training)
        .map_err(|e| format!("Config validation failed: {e}"))?;

    log(level, LogLevel::Normal, "✓ Run spec is valid");
    if args.detailed {
        log(level, LogLevel::Normal, &format_model_info(&spec));
        log(level, LogLevel::Normal, &format_data_info(&spec));
        log(level, LogLevel::Normal, "  Optimizations (composition order):");
        log(level, LogLevel::Normal, &format_optimizations(&spec));
    }
    Ok(())
}
