//! Result and error types for storeprobe.

use thiserror::Error;

use crate::locator::Locator;

/// Result type for storeprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page error (script evaluation, driver disconnect)
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// A wait condition never became true within its budget
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Description of the condition
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A direct lookup found zero matches
    #[error("No element matches {locator}")]
    ElementNotFound {
        /// Locator that matched nothing
        locator: String,
    },

    /// An expected text or condition did not hold
    #[error("Assertion failed: {message} (expected {expected:?}, actual {actual:?})")]
    AssertionFailed {
        /// What was being checked
        message: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// Dialog handling was requested but no native dialog is displayed
    #[error("No native dialog is displayed")]
    NoDialog,

    /// The page cannot be touched while a native dialog is open
    #[error("Native {kind} dialog is blocking the page: {message:?}")]
    DialogBlocking {
        /// Dialog kind
        kind: String,
        /// Dialog message
        message: String,
    },

    /// A scenario step failed
    #[error("Step {index} ({step}) failed: {source}")]
    StepFailed {
        /// Zero-based step index
        index: usize,
        /// Step description
        step: String,
        /// Underlying failure
        #[source]
        source: Box<ProbeError>,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// The scenario failed and its browser then failed to close
    #[error("{source} (teardown also failed: {teardown})")]
    TeardownAfterFailure {
        /// Close error message
        teardown: String,
        /// The scenario's own failure
        #[source]
        source: Box<ProbeError>,
    },

    /// Scenario body panicked
    #[error("Scenario panicked: {message}")]
    Panicked {
        /// Panic payload
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an element-not-found error for a locator
    #[must_use]
    pub fn element_not_found(locator: &Locator) -> Self {
        Self::ElementNotFound {
            locator: locator.to_string(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AssertionFailed {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether a wait probe may succeed later after this error
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::DialogBlocking { .. }
        )
    }

    /// The innermost error, looking through step and teardown wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StepFailed { source, .. } | Self::TeardownAfterFailure { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Index of the step that failed, if a step failed
    #[must_use]
    pub fn failed_step(&self) -> Option<usize> {
        match self {
            Self::StepFailed { index, .. } => Some(*index),
            Self::TeardownAfterFailure { source, .. } => source.failed_step(),
            _ => None,
        }
    }
}

/// Shorten page content for assertion messages.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}... ({} bytes)", text.len())
    } else {
        head
    }
}
