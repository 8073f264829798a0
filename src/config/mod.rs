//! Optimization config registry and run specs
//!
//! - [`OptimizationConfig`]: one typed technique config, tagged by `type`
//! - [`ConfigList`]: the ordered configs for one run, validated as a set
//! - [`RunSpec`]: YAML description of a complete CLI run
//! - CLI argument types

mod cli;
mod error;
mod optimization;
mod registry;
mod spec;

pub use cli::{
    apply_overrides, parse_args, Cli, Command, InspectArgs, OptimizeArgs, OutputFormat, ValidateArgs,
};
pub use error::ConfigError;
pub use optimization::{OptimizationConfig, Technique};
pub use registry::ConfigList;
pub use spec::{load_spec, CalibrationSource, DatasetSpec, RunSpec};
