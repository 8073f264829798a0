//! Optimize command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_spec, OptimizeArgs};
use crate::orchestrate::{OptimizedModel, Orchestrator};

use super::prepare::{prepare, PreparedRun};

pub fn run_optimize(args: OptimizeArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Loading run spec: {}", args.spec.display()));

    let mut spec = load_spec(&args.spec).map_err(|e| e.to_string())?;
    apply_overrides(&mut spec, &args);

    let PreparedRun { spec, student, teacher, data } = prepare(spec).map_err(|e| e.to_string())?;
    log(
        level,
        LogLevel::Verbose,
        &format!("  Training examples: {}\n  Techniques: {:?}", data.train.len(), spec.optimizations.techniques()),
    );
    let ctx = data.into_context(spec.metric.clone(), teacher.as_ref());

    if args.dry_run {
        spec.optimizations
            .validate(&ctx, &student, &spec.training)
            .map_err(|e| format!("Config validation failed: {e}"))?;
        log(level, LogLevel::Normal, "Dry run: run spec is valid, skipping training");
        return Ok(());
    }

    let mut orchestrator = Orchestrator::new(spec.environment.clone(), spec.training.clone());
    let optimized = orchestrator
        .optimize(student, &ctx, &spec.optimizations)
        .map_err(|e| format!("Optimization failed: {e}"))?;

    log(level, LogLevel::Normal, &format_summary(&optimized, spec.metric.as_ref()));
    if let Some(dir) = &spec.training.final_model_dir {
        log(level, LogLevel::Normal, &format!("Optimized model saved to: {}", dir.display()));
    }
    Ok(())
}

/// Human-readable run summary
pub fn format_summary(optimized: &OptimizedModel, metric: Option<&crate::eval::Metric>) -> String {
    let report = optimized.report();
    let mut lines = vec![format!("Optimization complete ({} steps)", report.steps)];
    for applied in &report.techniques {
        lines.push(format!("  {}: {}", applied.technique, applied.detail));
    }
    for (layer, sparsity) in &report.sparsity {
        lines.push(format!("  {layer} sparsity: {sparsity:.4}"));
    }
    lines.push(format!("  Classifier: {}", optimized.model().classifier().type_name()));
    if let Some(loss) = report.final_loss() {
        lines.push(format!("  Final loss: {loss:.4}"));
    }
    if let Some(eval) = &report.eval {
        lines.push(format!("  Eval accuracy: {:.4}", eval.eval_accuracy));
    }
    if let Some(cmp) = metric.and_then(|m| report.compare(m)) {
        let verdict = if cmp.accepted { "accepted" } else { "rejected" };
        lines.push(format!(
            "  Metric: baseline {:.4}, candidate {:.4}, degradation {:.4} ({verdict})",
            cmp.baseline, cmp.candidate, cmp.degradation
        ));
    }
    if report.stopped_early {
        lines.push("  Stopped early".to_string());
    }
    lines.join("\n")
}
