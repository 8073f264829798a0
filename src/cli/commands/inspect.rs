//! Inspect command implementation

use std::path::Path;

use serde::Serialize;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{InspectArgs, OutputFormat};
use crate::model::SequenceClassifier;
use crate::orchestrate::{OptimizationReport, REPORT_FILE};

/// One linear layer of a saved model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub type_name: String,
    pub shape: [usize; 2],
    pub sparsity: f32,
    pub masked: bool,
}

/// What `inspect` reports about a model directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub num_params: usize,
    pub num_labels: usize,
    pub layers: Vec<LayerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<OptimizationReport>,
}

pub fn summarize(dir: &Path) -> Result<ModelSummary, String> {
    let model = SequenceClassifier::from_pretrained(dir).map_err(|e| e.to_string())?;
    let layers = model
        .layer_names()
        .iter()
        .filter_map(|&name| model.layer(name).map(|layer| (name, layer)))
        .map(|(name, layer)| {
            let linear = layer.linear();
            LayerSummary {
                name: name.to_string(),
                type_name: layer.type_name().to_string(),
                shape: [linear.out_features(), linear.in_features()],
                sparsity: linear.sparsity(),
                masked: linear.mask().is_some(),
            }
        })
        .collect();

    let report_path = dir.join(REPORT_FILE);
    let report = if report_path.is_file() {
        let text = std::fs::read_to_string(&report_path).map_err(|e| format!("Failed to read report: {e}"))?;
        Some(serde_json::from_str(&text).map_err(|e| format!("Failed to parse report: {e}"))?)
    } else {
        None
    };

    Ok(ModelSummary { num_params: model.num_params(), num_labels: model.num_labels(), layers, report })
}

fn format_text(summary: &ModelSummary) -> String {
    let mut lines = vec![
        "Model Information:".to_string(),
        format!("  Parameters: {}", summary.num_params),
        format!("  Labels: {}", summary.num_labels),
    ];
    for layer in &summary.layers {
        lines.push(format!(
            "  {} [{}x{}] {} sparsity {:.4}{}",
            layer.name,
            layer.shape[0],
            layer.shape[1],
            layer.type_name,
            layer.sparsity,
            if layer.masked { " (masked)" } else { "" }
        ));
    }
    if let Some(report) = &summary.report {
        lines.push(format!("  Optimized over {} steps:", report.steps));
        for applied in &report.techniques {
            lines.push(format!("    {}: {}", applied.technique, applied.detail));
        }
    }
    lines.join("\n")
}

pub fn run_inspect(args: InspectArgs, level: LogLevel) -> Result<(), String> {
    let summary = summarize(&args.model_dir)?;
    match args.format {
        OutputFormat::Text => log(level, LogLevel::Normal, &format_text(&summary)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
            // JSON goes to stdout even in quiet mode so it can be piped
            println!("{json}");
        }
    }
    Ok(())
}
