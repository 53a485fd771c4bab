//! Native browser dialogs (alert, confirm, prompt, beforeunload).
//!
//! A dialog is an explicit value returned by the driver's "current dialog"
//! query. In-page popups built from DOM elements are not dialogs; they are
//! reached through ordinary locators and element waits.

use serde::{Deserialize, Serialize};

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
    /// Before unload dialog (Leave/Stay buttons)
    BeforeUnload,
}

impl std::fmt::Display for DialogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
            Self::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// How a dialog was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// OK/Yes/Leave
    Accept,
    /// Cancel/No/Stay
    Dismiss,
}

impl DialogAction {
    /// Whether the action accepts the dialog
    #[must_use]
    pub const fn accepts(self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// A native dialog currently displayed by the browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    kind: DialogType,
    message: String,
}

impl Dialog {
    /// Create a new dialog
    #[must_use]
    pub fn new(kind: DialogType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an alert dialog
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogType::Alert, message)
    }

    /// Create a confirm dialog
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogType::Confirm, message)
    }

    /// Get dialog type
    #[must_use]
    pub const fn kind(&self) -> DialogType {
        self.kind
    }

    /// Get dialog message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the message contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.message.contains(needle)
    }
}
