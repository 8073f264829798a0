//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! orquestar optimize run.yaml
//! orquestar optimize run.yaml --epochs 1 --save-to ./optimized
//! orquestar validate run.yaml
//! orquestar inspect ./optimized
//! ```

mod core;

pub use core::{
    apply_overrides, parse_args, Cli, Command, InspectArgs, OptimizeArgs, OutputFormat, ValidateArgs,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalibrationSource, ConfigList, DatasetSpec, RunSpec};
    use std::path::PathBuf;

    fn spec() -> RunSpec {
        RunSpec {
            model: "student".to_string(),
            teacher: None,
            hub_root: PathBuf::from("models"),
            dataset: DatasetSpec {
                path: PathBuf::from("train.jsonl"),
                select: None,
                eval_path: None,
                calibration: CalibrationSource::Eval,
            },
            tokenizer: Default::default(),
            training: Default::default(),
            environment: Default::default(),
            metric: None,
            optimizations: ConfigList::new(),
        }
    }

    #[test]
    fn test_parse_optimize_command() {
        let cli = parse_args(["orquestar", "optimize", "run.yaml"]).unwrap();
        match cli.command {
            Command::Optimize(args) => {
                assert_eq!(args.spec, PathBuf::from("run.yaml"));
                assert!(!args.dry_run);
                assert!(args.epochs.is_none());
            }
            other => panic!("Expected Optimize command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_optimize_with_overrides() {
        let cli = parse_args([
            "orquestar",
            "optimize",
            "run.yaml",
            "--epochs",
            "2",
            "--batch-size",
            "4",
            "--lr",
            "0.001",
            "--seed",
            "7",
            "--save-to",
            "./out",
        ])
        .unwrap();

        let Command::Optimize(args) = cli.command else {
            panic!("Expected Optimize command");
        };
        let mut spec = spec();
        apply_overrides(&mut spec, &args);
        assert_eq!(spec.training.epochs, 2);
        assert_eq!(spec.training.batch_size, 4);
        assert!((spec.training.learning_rate - 0.001).abs() < 1e-9);
        assert_eq!(spec.environment.seed, 7);
        assert_eq!(spec.training.final_model_dir, Some(PathBuf::from("./out")));
    }

    #[test]
    fn test_parse_validate_and_inspect() {
        let cli = parse_args(["orquestar", "validate", "run.yaml", "--detailed"]).unwrap();
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { detailed: true, .. })));

        let cli = parse_args(["orquestar", "inspect", "model_dir", "--format", "json"]).unwrap();
        match cli.command {
            Command::Inspect(args) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("Expected Inspect command, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["orquestar", "-v", "validate", "run.yaml"]).unwrap();
        assert!(cli.verbose && !cli.quiet);
        let cli = parse_args(["orquestar", "validate", "run.yaml", "--quiet"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_missing_spec_and_unknown_command() {
        assert!(parse_args(["orquestar", "optimize"]).is_err());
        assert!(parse_args(["orquestar", "merge"]).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn spec_path_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_-]{0,20}\\.(yaml|yml)"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_optimize_command_parses(spec in spec_path_strategy(), epochs in 1usize..1000) {
            let epochs_str = epochs.to_string();
            let cli = parse_args(["orquestar", "optimize", &spec, "--epochs", &epochs_str]).unwrap();
            match cli.command {
                Command::Optimize(args) => {
                    prop_assert_eq!(args.spec.to_str().unwrap(), &spec);
                    prop_assert_eq!(args.epochs, Some(epochs));
                }
                _ => prop_assert!(false, "Expected Optimize command"),
            }
        }
    }
}
