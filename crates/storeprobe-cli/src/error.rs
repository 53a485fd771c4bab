//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more scenarios failed
    #[error("{} scenario(s) failed: {}", names.len(), names.join(", "))]
    ScenariosFailed {
        /// Names of the failing scenarios in run order
        names: Vec<String>,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// storeprobe library error
    #[error("{0}")]
    Probe(#[from] storeprobe::ProbeError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Failure listing the given scenario names
    #[must_use]
    pub fn scenarios_failed<S: AsRef<str>>(names: &[S]) -> Self {
        Self::ScenariosFailed {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad value");
        assert_eq!(err.to_string(), "Configuration error: bad value");
    }

    #[test]
    fn test_scenarios_failed_lists_names() {
        let err = CliError::scenarios_failed(&["login_valid_user", "place_order"]);
        assert_eq!(
            err.to_string(),
            "2 scenario(s) failed: login_valid_user, place_order"
        );
    }

    #[test]
    fn test_from_probe_error() {
        let err: CliError = storeprobe::ProbeError::config("base_url missing").into();
        assert!(matches!(err, CliError::Probe(_)));
        assert!(err.to_string().contains("base_url missing"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CliError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
