//! Wait policy: bounded polling of a tagged condition.
//!
//! The storefront mutates its DOM asynchronously after user actions, so every
//! synchronization point is a [`WaitCondition`] polled by a [`Waiter`] until it
//! holds or the timeout elapses. Each probe is itself bounded by the time
//! left, so a driver call that never returns (a page stalled behind a native
//! dialog) cannot stretch a wait past its budget.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::dialog::Dialog;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// A predicate over browser state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitCondition {
    /// At least one element matches
    ElementPresent {
        /// Element to find
        locator: Locator,
    },
    /// The element's text contains `text`
    TextContains {
        /// Element to read
        locator: Locator,
        /// Expected substring
        text: String,
    },
    /// The element's text no longer contains `text`, or the element is gone
    TextAbsent {
        /// Element to read
        locator: Locator,
        /// Substring that must disappear
        text: String,
    },
    /// A native dialog is displayed
    AlertPresent,
    /// The element exists and is rendered
    Visible {
        /// Element to check
        locator: Locator,
    },
}

impl WaitCondition {
    /// Element-present condition
    #[must_use]
    pub const fn present(locator: Locator) -> Self {
        Self::ElementPresent { locator }
    }

    /// Text-contains condition
    #[must_use]
    pub fn text_contains(locator: Locator, text: impl Into<String>) -> Self {
        Self::TextContains {
            locator,
            text: text.into(),
        }
    }

    /// Text-absent condition
    #[must_use]
    pub fn text_absent(locator: Locator, text: impl Into<String>) -> Self {
        Self::TextAbsent {
            locator,
            text: text.into(),
        }
    }

    /// Alert-present condition
    #[must_use]
    pub const fn alert() -> Self {
        Self::AlertPresent
    }

    /// Visible condition
    #[must_use]
    pub const fn visible(locator: Locator) -> Self {
        Self::Visible { locator }
    }

    /// Evaluate the condition once.
    ///
    /// `Ok(None)` means "not yet".
    async fn probe(&self, driver: &dyn BrowserDriver) -> ProbeResult<Option<Satisfied>> {
        match self {
            Self::ElementPresent { locator } => Ok(first(driver, locator)
                .await?
                .map(Satisfied::Element)),
            Self::TextContains { locator, text } => Ok(first(driver, locator)
                .await?
                .filter(|el| el.text.contains(text.as_str()))
                .map(Satisfied::Element)),
            Self::TextAbsent { locator, text } => {
                let still_there = first(driver, locator)
                    .await?
                    .is_some_and(|el| el.text.contains(text.as_str()));
                Ok((!still_there).then_some(Satisfied::Absent))
            }
            Self::AlertPresent => Ok(driver.current_dialog().await?.map(Satisfied::Dialog)),
            Self::Visible { locator } => Ok(first(driver, locator)
                .await?
                .filter(|el| el.visible)
                .map(Satisfied::Element)),
        }
    }
}

async fn first(driver: &dyn BrowserDriver, locator: &Locator) -> ProbeResult<Option<ElementHandle>> {
    Ok(driver.find_elements(locator).await?.into_iter().next())
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementPresent { locator } => write!(f, "presence of {locator}"),
            Self::TextContains { locator, text } => write!(f, "{text:?} in text of {locator}"),
            Self::TextAbsent { locator, text } => {
                write!(f, "{text:?} to leave text of {locator}")
            }
            Self::AlertPresent => write!(f, "a native dialog"),
            Self::Visible { locator } => write!(f, "visibility of {locator}"),
        }
    }
}

/// What a satisfied wait produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Satisfied {
    /// The matched element (present, text, visible conditions)
    Element(ElementHandle),
    /// The displayed dialog (alert condition)
    Dialog(Dialog),
    /// The text or element is gone
    Absent,
}

impl Satisfied {
    /// The element, if the condition yields one
    #[must_use]
    pub fn into_element(self) -> Option<ElementHandle> {
        match self {
            Self::Element(el) => Some(el),
            Self::Dialog(_) | Self::Absent => None,
        }
    }

    /// The dialog, if the condition yields one
    #[must_use]
    pub fn into_dialog(self) -> Option<Dialog> {
        match self {
            Self::Dialog(dialog) => Some(dialog),
            Self::Element(_) | Self::Absent => None,
        }
    }
}

/// Polls wait conditions under one [`WaitOptions`] budget
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll `condition` until it holds or the timeout elapses.
    ///
    /// Lookup misses and dialog-blocked probes count as "not yet"; any other
    /// driver error ends the wait immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Timeout`] if the condition never held, or the
    /// first non-transient driver error.
    pub async fn until(
        &self,
        driver: &dyn BrowserDriver,
        condition: &WaitCondition,
    ) -> ProbeResult<Satisfied> {
        let start = Instant::now();
        let deadline = start + self.options.timeout();
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, condition.probe(driver)).await {
                Ok(Ok(Some(satisfied))) => {
                    debug!(%condition, polls, elapsed_ms = start.elapsed().as_millis() as u64, "wait satisfied");
                    return Ok(satisfied);
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) if err.is_transient() => {
                    debug!(%condition, error = %err, "probe not ready");
                }
                Ok(Err(err)) => return Err(err),
                Err(_) => debug!(%condition, "probe overran remaining budget"),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(%condition, polls, "wait timed out");
                return Err(ProbeError::Timeout {
                    condition: condition.to_string(),
                    ms: self.options.timeout_ms,
                });
            }
            tokio::time::sleep(self.options.poll_interval().min(deadline - now)).await;
        }
    }
}
