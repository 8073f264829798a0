//! Orquestar CLI
//!
//! Runs combined pruning, distillation and quantization-aware training from
//! a YAML run spec.
//!
//! # Usage
//!
//! ```bash
//! # Optimize the student named in the spec
//! orquestar optimize run.yaml
//!
//! # Optimize with overrides and save the result
//! orquestar optimize run.yaml --epochs 1 --save-to ./orchestrate_optimizations_model
//!
//! # Validate a spec without training
//! orquestar validate run.yaml --detailed
//!
//! # Show layer types and sparsity of a saved model
//! orquestar inspect ./orchestrate_optimizations_model --format json
//! ```

use clap::Parser;
use orquestar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
