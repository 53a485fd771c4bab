//! Locators: immutable `(strategy, value)` pairs naming one DOM element.
//!
//! Every strategy lowers to an XPath expression, so a driver only needs a
//! single query primitive to resolve any locator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a locator's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Element `id` attribute
    Id,
    /// Exact (whitespace-normalized) text of an anchor
    LinkText,
    /// Raw XPath expression
    XPath,
    /// One entry of the `class` attribute
    ClassName,
}

impl Strategy {
    /// Short name used in logs and reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::LinkText => "link_text",
            Self::XPath => "xpath",
            Self::ClassName => "class_name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy + value pair identifying a DOM element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    strategy: Strategy,
    value: String,
}

impl Locator {
    /// Create a locator
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Locate by `id` attribute
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Locate an anchor by its text
    #[must_use]
    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    /// Locate by XPath expression
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Locate by class name
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the raw value
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Lower this locator to an XPath expression
    #[must_use]
    pub fn to_xpath(&self) -> String {
        match self.strategy {
            Strategy::Id => format!("//*[@id={}]", xpath_literal(&self.value)),
            Strategy::LinkText => {
                format!("//a[normalize-space(.)={}]", xpath_literal(self.value.trim()))
            }
            Strategy::XPath => self.value.clone(),
            Strategy::ClassName => format!(
                "//*[contains(concat(' ', normalize-space(@class), ' '), {})]",
                xpath_literal(&format!(" {} ", self.value.trim()))
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath 1.0 has no escape sequences, so values holding both quote kinds are
/// assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
