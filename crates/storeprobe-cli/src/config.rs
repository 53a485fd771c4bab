//! CLI configuration and suite overrides

use serde::{Deserialize, Serialize};
use storeprobe::SuiteConfig;

use crate::commands::RunArgs;
use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - scenario logs
    Verbose,
    /// Debug - every driver call
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Check if debug mode
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Log level used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_level(self) -> &'static str {
        match self {
            Self::Quiet | Self::Normal => "error",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Load the suite configuration and apply command-line overrides.
///
/// Flags win over the file; the merged result is validated again so a bad
/// `--base-url` is rejected before any browser starts.
pub fn resolve_suite_config(args: &RunArgs) -> CliResult<SuiteConfig> {
    let mut suite = match &args.config {
        Some(path) => SuiteConfig::from_file(path)?,
        None => SuiteConfig::default(),
    };

    if let Some(url) = &args.base_url {
        suite.base_url.clone_from(url);
    }
    if let Some(secs) = args.timeout_secs {
        suite.wait.timeout_ms = secs.saturating_mul(1000);
    }
    if let Some(ms) = args.poll_interval_ms {
        suite.wait.poll_interval_ms = ms;
    }
    if args.headed {
        suite.browser.headless = false;
    }
    if let Some(path) = &args.chromium_path {
        suite.browser.chromium_path = Some(path.clone());
    }
    if args.no_sandbox {
        suite.browser.sandbox = false;
    }
    if let Some(welcome) = &args.expected_welcome {
        suite.data.expected_welcome.clone_from(welcome);
    }
    suite.fail_fast |= args.fail_fast;

    suite.validate()?;
    Ok(suite)
}
