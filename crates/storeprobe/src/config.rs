//! Suite configuration, loadable from YAML.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```yaml
//! base_url: https://www.demoblaze.com/
//! browser:
//!   headless: false
//! wait:
//!   timeout_ms: 15000
//! data:
//!   expected_welcome: Welcome gopi_test
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::browser::BrowserConfig;
use crate::result::{ProbeError, ProbeResult};
use crate::storefront::{StorefrontData, BASE_URL};
use crate::wait::WaitOptions;

/// Everything a suite run needs besides the scenario list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Page every session opens first
    pub base_url: String,
    /// Browser launch options
    pub browser: BrowserConfig,
    /// Wait policy for every session
    pub wait: WaitOptions,
    /// Credentials, products and expected texts
    pub data: StorefrontData,
    /// Stop after the first failing scenario
    pub fail_fast: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            browser: BrowserConfig::default(),
            wait: WaitOptions::default(),
            data: StorefrontData::default(),
            fail_fast: false,
        }
    }
}

impl SuiteConfig {
    /// Parse from YAML text
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed or fails validation
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Set the wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the test data
    #[must_use]
    pub fn with_data(mut self, data: StorefrontData) -> Self {
        self.data = data;
        self
    }

    /// Set fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check values serde cannot
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] naming the offending field
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(ProbeError::config("wait.poll_interval_ms must be positive"));
        }
        if self.wait.timeout_ms == 0 {
            return Err(ProbeError::config("wait.timeout_ms must be positive"));
        }
        if self.browser.command_timeout_ms == 0 {
            return Err(ProbeError::config("browser.command_timeout_ms must be positive"));
        }
        Ok(())
    }
}
