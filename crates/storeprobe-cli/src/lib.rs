//! storeprobe CLI library
//!
//! Command-line front end for the storeprobe scenario suite.
//!
//! ## Usage
//!
//! ```bash
//! storeprobe list --steps                 # Show scenarios and their steps
//! storeprobe run                          # Run all five scenarios headless
//! storeprobe run --filter cart --headed   # Watch the cart scenarios
//! storeprobe run --config suite.yaml --format json
//! ```

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, FormatArg, ListArgs, RunArgs};
pub use config::{resolve_suite_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_report_json, render_scenarios, OutputFormat, ProgressReporter};
pub use runner::ScenarioRunner;
