//! Scenarios: named, branch-free sequences of steps.
//!
//! A scenario is data. Executing it walks the steps in order against one
//! session and stops at the first failure, wrapping it in
//! [`ProbeError::StepFailed`] so reports can name the step that broke.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::locator::Locator;
use crate::result::{excerpt, ProbeError, ProbeResult};
use crate::session::{Lookup, Session, SessionTask};
use crate::wait::WaitCondition;

const EXCERPT_CHARS: usize = 160;

/// One action or check within a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Click an element
    Click {
        /// Element to click
        locator: Locator,
        /// How to find it
        #[serde(default)]
        lookup: Lookup,
    },
    /// Type text into an element
    Type {
        /// Input element
        locator: Locator,
        /// Text to append
        text: String,
        /// How to find it
        #[serde(default)]
        lookup: Lookup,
    },
    /// Block until a condition holds
    Wait {
        /// Condition to poll
        condition: WaitCondition,
    },
    /// Accept the native dialog
    AcceptDialog,
    /// Dismiss the native dialog
    DismissDialog,
    /// Page source contains a string
    AssertPageContains {
        /// Expected substring
        text: String,
    },
    /// Page source does not contain a string
    AssertPageLacks {
        /// Forbidden substring
        text: String,
    },
    /// The displayed native dialog's message contains a string
    AssertDialogContains {
        /// Expected substring
        text: String,
    },
    /// An element's trimmed text equals a string
    AssertElementText {
        /// Element to read
        locator: Locator,
        /// Expected text
        expected: String,
    },
}

impl Step {
    /// Click after waiting for presence
    #[must_use]
    pub const fn click(locator: Locator) -> Self {
        Self::Click {
            locator,
            lookup: Lookup::Waited,
        }
    }

    /// Click without waiting
    #[must_use]
    pub const fn click_now(locator: Locator) -> Self {
        Self::Click {
            locator,
            lookup: Lookup::Direct,
        }
    }

    /// Type after waiting for presence
    #[must_use]
    pub fn type_text(locator: Locator, text: impl Into<String>) -> Self {
        Self::Type {
            locator,
            text: text.into(),
            lookup: Lookup::Waited,
        }
    }

    /// Type without waiting
    #[must_use]
    pub fn type_now(locator: Locator, text: impl Into<String>) -> Self {
        Self::Type {
            locator,
            text: text.into(),
            lookup: Lookup::Direct,
        }
    }

    /// Wait for a condition
    #[must_use]
    pub const fn wait(condition: WaitCondition) -> Self {
        Self::Wait { condition }
    }

    /// Assert the page source contains `text`
    #[must_use]
    pub fn page_contains(text: impl Into<String>) -> Self {
        Self::AssertPageContains { text: text.into() }
    }

    /// Assert the page source lacks `text`
    #[must_use]
    pub fn page_lacks(text: impl Into<String>) -> Self {
        Self::AssertPageLacks { text: text.into() }
    }

    /// Assert the native dialog mentions `text`
    #[must_use]
    pub fn dialog_contains(text: impl Into<String>) -> Self {
        Self::AssertDialogContains { text: text.into() }
    }

    /// Assert an element's text
    #[must_use]
    pub fn element_text(locator: Locator, expected: impl Into<String>) -> Self {
        Self::AssertElementText {
            locator,
            expected: expected.into(),
        }
    }

    async fn apply(&self, session: &mut Session) -> ProbeResult<()> {
        match self {
            Self::Click { locator, lookup } => session.click(locator, *lookup).await,
            Self::Type {
                locator,
                text,
                lookup,
            } => session.type_text(locator, text, *lookup).await,
            Self::Wait { condition } => session.wait_until(condition).await.map(drop),
            Self::AcceptDialog => session.accept_dialog().await.map(drop),
            Self::DismissDialog => session.dismiss_dialog().await.map(drop),
            Self::AssertPageContains { text } => {
                let source = session.page_source().await?;
                if source.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(ProbeError::assertion(
                        "page should contain text",
                        text,
                        excerpt(&source, EXCERPT_CHARS),
                    ))
                }
            }
            Self::AssertPageLacks { text } => {
                let source = session.page_source().await?;
                if source.contains(text.as_str()) {
                    Err(ProbeError::assertion(
                        "page should not contain text",
                        format!("no {text:?}"),
                        excerpt(&source, EXCERPT_CHARS),
                    ))
                } else {
                    Ok(())
                }
            }
            Self::AssertDialogContains { text } => match session.current_dialog().await? {
                Some(dialog) if dialog.contains(text) => Ok(()),
                Some(dialog) => Err(ProbeError::assertion(
                    format!("{} message should contain text", dialog.kind()),
                    text,
                    dialog.message(),
                )),
                None => Err(ProbeError::NoDialog),
            },
            Self::AssertElementText { locator, expected } => {
                let element = session.lookup(locator, Lookup::Direct).await?;
                if element.text.trim() == expected.as_str() {
                    Ok(())
                } else {
                    Err(ProbeError::assertion(
                        format!("text of {locator}"),
                        expected,
                        element.text.trim(),
                    ))
                }
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { locator, lookup } => match lookup {
                Lookup::Waited => write!(f, "click {locator}"),
                Lookup::Direct => write!(f, "click {locator} (direct)"),
            },
            Self::Type { locator, text, .. } => write!(f, "type {text:?} into {locator}"),
            Self::Wait { condition } => write!(f, "wait for {condition}"),
            Self::AcceptDialog => write!(f, "accept dialog"),
            Self::DismissDialog => write!(f, "dismiss dialog"),
            Self::AssertPageContains { text } => write!(f, "assert page contains {text:?}"),
            Self::AssertPageLacks { text } => write!(f, "assert page lacks {text:?}"),
            Self::AssertDialogContains { text } => write!(f, "assert dialog contains {text:?}"),
            Self::AssertElementText { locator, expected } => {
                write!(f, "assert text of {locator} is {expected:?}")
            }
        }
    }
}

/// A named user journey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    name: String,
    #[serde(default)]
    description: String,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create an empty scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a step
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps
    #[must_use]
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The ordered steps
    #[must_use]
    pub fn step_list(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::StepFailed`] carrying the failing step's index
    /// and description.
    pub async fn execute(&self, session: &mut Session) -> ProbeResult<()> {
        info!(scenario = %self.name, steps = self.steps.len(), "scenario started");
        for (index, step) in self.steps.iter().enumerate() {
            debug!(scenario = %self.name, index, %step, "step");
            step.apply(session)
                .await
                .map_err(|source| ProbeError::StepFailed {
                    index,
                    step: step.to_string(),
                    source: Box::new(source),
                })?;
        }
        info!(scenario = %self.name, "scenario passed");
        Ok(())
    }
}

#[async_trait]
impl SessionTask for Scenario {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, session: &mut Session) -> ProbeResult<()> {
        self.execute(session).await
    }
}
