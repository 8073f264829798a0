//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::RunSpec;

/// Orquestar: combined pruning, distillation and quantization-aware training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "orquestar")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Apply pruning, knowledge distillation and QAT to a classifier in one training loop")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the optimizations described by a YAML run spec
    Optimize(OptimizeArgs),

    /// Validate a run spec without training
    Validate(ValidateArgs),

    /// Show the structure of a saved model
    Inspect(InspectArgs),
}

/// Arguments for the optimize command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct OptimizeArgs {
    /// Path to YAML run spec
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Override checkpoint directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Save the optimized model here
    #[arg(long)]
    pub save_to: Option<PathBuf>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f32>,

    /// Save checkpoint every N steps
    #[arg(long)]
    pub save_every: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Validate everything but don't train
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML run spec
    #[arg(value_name = "SPEC")]
    pub spec: PathBuf,

    /// Print the resolved spec
    #[arg(short, long)]
    pub detailed: bool,
}

/// Output format for inspect
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the inspect command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InspectArgs {
    /// Directory holding config.json and model.safetensors
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a run spec
pub fn apply_overrides(spec: &mut RunSpec, args: &OptimizeArgs) {
    if let Some(output_dir) = &args.output_dir {
        spec.training.output_dir = output_dir.clone();
    }
    if let Some(save_to) = &args.save_to {
        spec.training.final_model_dir = Some(save_to.clone());
    }
    if let Some(epochs) = args.epochs {
        spec.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        spec.training.batch_size = batch_size;
    }
    if let Some(lr) = args.lr {
        spec.training.learning_rate = lr;
    }
    if let Some(save_every) = args.save_every {
        spec.training.save_steps = Some(save_every);
    }
    if let Some(seed) = args.seed {
        spec.environment.seed = seed;
    }
}
