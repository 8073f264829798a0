//! YAML run spec for the `orquestar` binary

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::registry::ConfigList;
use crate::data::TokenizerOptions;
use crate::error::{Error, Result};
use crate::eval::Metric;
use crate::orchestrate::RunEnvironment;
use crate::train::TrainingArgs;

/// Where activation-range calibration batches come from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationSource {
    /// Reuse the training split
    Train,
    /// Reuse the evaluation split
    #[default]
    Eval,
    /// A separate JSONL file
    File(PathBuf),
    /// No calibration data
    Disabled,
}

/// Dataset section of a run spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// JSONL file with `sentence` and `label` fields
    pub path: PathBuf,

    /// Keep only the first N examples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<usize>,

    /// Separate evaluation file; defaults to the training examples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_path: Option<PathBuf>,

    #[serde(default)]
    pub calibration: CalibrationSource,
}

/// Everything one `orquestar optimize` invocation needs
///
/// ```yaml
/// model: distilbert-student
/// teacher: distilbert-sst2
/// hub_root: ./models
/// dataset:
///   path: data/sst2_validation.jsonl
///   select: 30
/// training:
///   epochs: 1
/// optimizations:
///   - type: pruning
///     target_sparsity: 0.64
///     pruners: [{ start_step: 0, end_step: 2 }]
///   - type: distillation
///     criterion: { loss_types: [CE, KL] }
///   - type: quantization
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Student identifier under `hub_root`
    pub model: String,

    /// Teacher identifier under `hub_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,

    /// Model hub directory
    #[serde(default = "default_hub_root")]
    pub hub_root: PathBuf,

    pub dataset: DatasetSpec,

    #[serde(default)]
    pub tokenizer: TokenizerOptions,

    #[serde(default)]
    pub training: TrainingArgs,

    #[serde(default)]
    pub environment: RunEnvironment,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,

    pub optimizations: ConfigList,
}

fn default_hub_root() -> PathBuf {
    PathBuf::from("models")
}

impl RunSpec {
    /// Resolve relative paths against the directory holding the spec file
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.hub_root);
        join(&mut self.dataset.path);
        if let Some(eval) = self.dataset.eval_path.as_mut() {
            join(eval);
        }
        if let CalibrationSource::File(path) = &mut self.dataset.calibration {
            join(path);
        }
    }

    /// Teacher identifier, falling back to the one named by the
    /// distillation config
    pub fn teacher_identifier(&self) -> Option<&str> {
        self.teacher
            .as_deref()
            .or_else(|| self.optimizations.distillation().and_then(|d| d.teacher.as_deref()))
    }
}

/// Read and parse a YAML run spec.
///
/// Relative paths inside the spec are resolved against its directory.
pub fn load_spec(path: impl AsRef<Path>) -> Result<RunSpec> {
    let path = path.as_ref();
    let spec_err = |message: String| Error::Spec { path: path.display().to_string(), message };

    let content = fs::read_to_string(path).map_err(|e| spec_err(e.to_string()))?;
    let mut spec: RunSpec = serde_yaml::from_str(&content).map_err(|e| spec_err(e.to_string()))?;
    spec.tokenizer.validate().map_err(spec_err)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    spec.resolve_paths(base);
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Technique;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SPEC: &str = r#"
model: student
teacher: teacher
dataset:
  path: sst2.jsonl
  select: 30
tokenizer:
  max_length: 64
training:
  epochs: 1
  output_dir: tmp_trainer
environment:
  seed: 42
  disable_external_reporting: true
metric:
  name: eval_accuracy
  is_relative: true
  criterion: 0.5
optimizations:
  - type: pruning
    target_sparsity: 0.64
    pruners:
      - start_step: 0
        end_step: 2
  - type: distillation
    criterion:
      loss_types: [CE, KL]
  - type: quantization
"#;

    #[test]
    fn test_load_spec_resolves_relative_paths() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SPEC.as_bytes()).unwrap();

        let spec = load_spec(file.path()).unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(spec.dataset.path, base.join("sst2.jsonl"));
        assert_eq!(spec.hub_root, base.join("models"));
        assert_eq!(spec.dataset.select, Some(30));
        assert_eq!(spec.dataset.calibration, CalibrationSource::Eval);
        assert_eq!(spec.training.epochs, 1);
        assert_eq!(spec.environment.seed, 42);
        assert_eq!(spec.teacher_identifier(), Some("teacher"));
        assert_eq!(
            spec.optimizations.techniques(),
            vec![Technique::Pruning, Technique::Distillation, Technique::Quantization]
        );
    }

    #[test]
    fn test_load_spec_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"model: [unterminated").unwrap();
        let err = load_spec(file.path()).unwrap_err();
        assert!(matches!(err, Error::Spec { .. }));
    }

    #[test]
    fn test_load_spec_missing_file() {
        assert!(load_spec("/nonexistent/run.yaml").is_err());
    }

    #[test]
    fn test_calibration_file_source() {
        let yaml = "path: a.jsonl\ncalibration: !file calib.jsonl\n";
        let ds: DatasetSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ds.calibration, CalibrationSource::File(PathBuf::from("calib.jsonl")));
    }
}
