//! CLI command implementations

mod inspect;
mod optimize;
mod prepare;
mod validate;


use crate::cli::logging::init_tracing;
use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    // Configure output based on verbose/quiet flags
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    init_tracing(log_level);

    match cli.command {
        Command::Optimize(args) => optimize::run_optimize(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Inspect(args) => inspect::run_inspect(args, log_level),
    }
}
