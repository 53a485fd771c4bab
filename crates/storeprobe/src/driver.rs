//! Abstract browser automation driver.
//!
//! Scenarios never talk to a browser directly. They go through
//! [`BrowserDriver`], so the CDP-backed `ChromiumDriver` and the in-memory
//! [`MockDriver`](crate::MockDriver) are interchangeable.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  BrowserDriver (trait)                                   │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐  ┌───────────────────────┐  │
//! │  │  ChromiumDriver         │  │  MockDriver           │  │
//! │  │  (feature = "browser")  │  │  (in-memory page)     │  │
//! │  │  CDP via chromiumoxide  │  │  unit + model tests   │  │
//! │  └─────────────────────────┘  └───────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dialog::{Dialog, DialogAction};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};

/// Snapshot of one element matched by a locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Locator the element was found with
    pub locator: Locator,
    /// Position among the locator's matches, in document order
    pub index: usize,
    /// Lower-case tag name
    pub tag_name: String,
    /// Rendered text at lookup time
    pub text: String,
    /// Whether the element was rendered (non-zero box, not hidden)
    pub visible: bool,
}

impl ElementHandle {
    /// Create a handle for the first match of `locator`
    #[must_use]
    pub fn new(locator: Locator, tag_name: impl Into<String>) -> Self {
        Self {
            locator,
            index: 0,
            tag_name: tag_name.into(),
            text: String::new(),
            visible: true,
        }
    }

    /// Set the position among matches
    #[must_use]
    pub const fn at(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Capability set the suite consumes from a browser automation library
#[async_trait]
pub trait BrowserDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Maximize the browser window
    async fn maximize(&mut self) -> ProbeResult<()>;

    /// Find every element matching the locator (possibly none)
    async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>>;

    /// Find the first element matching the locator
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ElementNotFound`] when nothing matches
    async fn find_element(&self, locator: &Locator) -> ProbeResult<ElementHandle> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::element_not_found(locator))
    }

    /// Click an element
    async fn click(&mut self, element: &ElementHandle) -> ProbeResult<()>;

    /// Type text into an element, appending to its current value
    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Serialized DOM of the current page
    async fn page_source(&self) -> ProbeResult<String>;

    /// Current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// The native dialog currently displayed, if any
    async fn current_dialog(&self) -> ProbeResult<Option<Dialog>>;

    /// Close the current native dialog
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::NoDialog`] when no dialog is displayed
    async fn handle_dialog(&mut self, action: DialogAction) -> ProbeResult<Dialog>;

    /// Accept the current native dialog
    async fn accept_dialog(&mut self) -> ProbeResult<Dialog> {
        self.handle_dialog(DialogAction::Accept).await
    }

    /// Dismiss the current native dialog
    async fn dismiss_dialog(&mut self) -> ProbeResult<Dialog> {
        self.handle_dialog(DialogAction::Dismiss).await
    }

    /// Close the browser
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Starts a fresh browser for each session
#[async_trait]
pub trait DriverLauncher: Send + Sync + std::fmt::Debug {
    /// Launch a new browser instance
    async fn launch(&self) -> ProbeResult<Box<dyn BrowserDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement};

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new(Locator::id("login2"), "a");
            assert_eq!(elem.index, 0);
            assert_eq!(elem.tag_name, "a");
            assert!(elem.text.is_empty());
            assert!(elem.visible);
        }

        #[test]
        fn test_element_handle_builders() {
            let elem = ElementHandle::new(Locator::link_text("Delete"), "a")
                .at(2)
                .with_text("Delete")
                .with_visible(false);
            assert_eq!(elem.index, 2);
            assert_eq!(elem.text, "Delete");
            assert!(!elem.visible);
        }
    }

    mod default_method_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_element_returns_first_match() {
            let driver = MockDriver::new();
            driver.with_page(|page| {
                page.insert(MockElement::new(Locator::link_text("Delete"), "a").with_text("one"));
                page.insert(MockElement::new(Locator::link_text("Delete"), "a").with_text("two"));
            });
            let found = driver
                .find_element(&Locator::link_text("Delete"))
                .await
                .unwrap();
            assert_eq!(found.index, 0);
            assert_eq!(found.text, "one");
        }

        #[tokio::test]
        async fn test_find_element_reports_missing_locator() {
            let driver = MockDriver::new();
            let err = driver.find_element(&Locator::id("nope")).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { ref locator } if locator == "id=nope"));
        }

        #[tokio::test]
        async fn test_accept_and_dismiss_route_through_handle_dialog() {
            let mut driver = MockDriver::new();
            driver.with_page(|page| page.open_dialog(Dialog::alert("Product added.")));
            let accepted = driver.accept_dialog().await.unwrap();
            assert_eq!(accepted.message(), "Product added.");

            driver.with_page(|page| page.open_dialog(Dialog::confirm("Sure?")));
            driver.dismiss_dialog().await.unwrap();
            assert!(driver.was_called("dialog:accept"));
            assert!(driver.was_called("dialog:dismiss"));
        }
    }
}
