//! Logging utilities for CLI output
//!
//! User-facing summaries go to stdout through [`log`]; library diagnostics
//! go through `tracing`, configured once by [`init_tracing`].

use tracing_subscriber::EnvFilter;

/// Log level for CLI output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }

    /// Default `tracing` filter directive for this level
    pub fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "info",
            LogLevel::Verbose => "debug",
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the level derived from the CLI flags. Calling this
/// twice is harmless; the second subscriber is ignored.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).try_init();
}
