//! In-memory driver for running scenarios without a browser.
//!
//! [`MockPage`] is a flat list of elements keyed by locator plus an optional
//! native dialog. Clicks fire registered reactions, and reactions can defer
//! DOM changes by a number of observations to mimic asynchronous page
//! updates. Every read (`find_elements`, `page_source`, `current_dialog`)
//! counts as one observation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dialog::{Dialog, DialogAction};
use crate::driver::{BrowserDriver, DriverLauncher, ElementHandle};
use crate::locator::{Locator, Strategy};
use crate::result::{ProbeError, ProbeResult};

/// Click handler registered on a locator
pub type Reaction = Arc<dyn Fn(&mut MockPage) + Send + Sync>;

type Deferred = Box<dyn FnOnce(&mut MockPage) + Send>;

/// An element of the mock page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Locator this element answers to
    pub locator: Locator,
    /// Tag name
    pub tag_name: String,
    /// Rendered text
    pub text: String,
    /// Input value
    pub value: String,
    /// Rendered or hidden
    pub visible: bool,
}

impl MockElement {
    /// Create a visible element with no text
    #[must_use]
    pub fn new(locator: Locator, tag_name: impl Into<String>) -> Self {
        Self {
            locator,
            tag_name: tag_name.into(),
            text: String::new(),
            value: String::new(),
            visible: true,
        }
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Mark as hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn render(&self, out: &mut String) {
        let attr = match self.locator.strategy() {
            Strategy::Id => format!(" id=\"{}\"", self.locator.value()),
            Strategy::ClassName => format!(" class=\"{}\"", self.locator.value()),
            Strategy::LinkText | Strategy::XPath => String::new(),
        };
        let style = if self.visible {
            ""
        } else {
            " style=\"display: none;\""
        };
        let _ = writeln!(
            out,
            "<{tag}{attr}{style}>{text}</{tag}>",
            tag = self.tag_name,
            text = self.text
        );
    }
}

/// State of a mock browser tab
#[derive(Default)]
pub struct MockPage {
    url: String,
    elements: Vec<MockElement>,
    dialog: Option<Dialog>,
    reactions: HashMap<Locator, Reaction>,
    deferred: Vec<(u64, Deferred)>,
    ticks: u64,
    history: Vec<String>,
    maximized: bool,
    close_count: usize,
    fail_close: bool,
    fail_navigation: bool,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("url", &self.url)
            .field("elements", &self.elements.len())
            .field("dialog", &self.dialog)
            .field("deferred", &self.deferred.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl MockPage {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the URL without recording a navigation
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Add an element at the end of the document
    pub fn insert(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Remove every element matching `locator`, returning how many went
    pub fn remove(&mut self, locator: &Locator) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| &e.locator != locator);
        before - self.elements.len()
    }

    /// Remove all elements (a navigation to another document)
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// First element matching `locator`
    #[must_use]
    pub fn element(&self, locator: &Locator) -> Option<&MockElement> {
        self.elements.iter().find(|e| &e.locator == locator)
    }

    /// Set the text of every element matching `locator`
    pub fn set_text(&mut self, locator: &Locator, text: &str) {
        for element in self.elements.iter_mut().filter(|e| &e.locator == locator) {
            element.text = text.to_string();
        }
    }

    /// Show or hide every element matching `locator`
    pub fn set_visible(&mut self, locator: &Locator, visible: bool) {
        for element in self.elements.iter_mut().filter(|e| &e.locator == locator) {
            element.visible = visible;
        }
    }

    /// Input value of the first element matching `locator`
    #[must_use]
    pub fn value_of(&self, locator: &Locator) -> Option<&str> {
        self.element(locator).map(|e| e.value.as_str())
    }

    /// Display a native dialog
    pub fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
    }

    /// Dialog currently displayed
    #[must_use]
    pub const fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Register the click handler for `locator`, replacing any previous one
    pub fn on_click<F>(&mut self, locator: Locator, reaction: F)
    where
        F: Fn(&mut Self) + Send + Sync + 'static,
    {
        let _ = self.reactions.insert(locator, Arc::new(reaction));
    }

    /// Run `effect` once `observations` more reads have happened
    pub fn after<F>(&mut self, observations: u64, effect: F)
    where
        F: FnOnce(&mut Self) + Send + 'static,
    {
        self.deferred
            .push((self.ticks + observations, Box::new(effect)));
    }

    /// Make `close` fail
    pub fn fail_close(&mut self) {
        self.fail_close = true;
    }

    /// Make `navigate` fail
    pub fn fail_navigation(&mut self) {
        self.fail_navigation = true;
    }

    /// Recorded driver calls
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Whether `maximize` ran
    #[must_use]
    pub const fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// How many times `close` ran
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }

    /// Serialized document
    #[must_use]
    pub fn render_source(&self) -> String {
        let mut out = String::from("<html><body>\n");
        for element in &self.elements {
            element.render(&mut out);
        }
        out.push_str("</body></html>");
        out
    }

    fn tick(&mut self) {
        self.ticks += 1;
        let now = self.ticks;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.deferred = pending;
        for (_, effect) in due {
            effect(self);
        }
    }

    fn ensure_unblocked(&self) -> ProbeResult<()> {
        match &self.dialog {
            Some(dialog) => Err(ProbeError::DialogBlocking {
                kind: dialog.kind().to_string(),
                message: dialog.message().to_string(),
            }),
            None => Ok(()),
        }
    }

    fn matches(&self, locator: &Locator) -> impl Iterator<Item = &MockElement> {
        let locator = locator.clone();
        self.elements.iter().filter(move |e| e.locator == locator)
    }

    fn resolve_mut(&mut self, handle: &ElementHandle) -> ProbeResult<&mut MockElement> {
        self.elements
            .iter_mut()
            .filter(|e| e.locator == handle.locator)
            .nth(handle.index)
            .ok_or_else(|| ProbeError::element_not_found(&handle.locator))
    }
}

/// Driver over a shared [`MockPage`]
///
/// Clones share the page, so a test can keep one clone for inspection while
/// the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    page: Arc<Mutex<MockPage>>,
}

impl MockDriver {
    /// Create a driver over an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver over a prepared page
    #[must_use]
    pub fn from_page(page: MockPage) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
        }
    }

    /// Run `f` with exclusive access to the page
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Recorded driver calls
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// How many times `close` ran
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    fn lock(&self) -> MutexGuard<'_, MockPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push(format!("navigate:{url}"));
        if page.fail_navigation {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: "mock navigation failure".to_string(),
            });
        }
        page.url = url.to_string();
        Ok(())
    }

    async fn maximize(&mut self) -> ProbeResult<()> {
        let mut page = self.lock();
        page.history.push("maximize".to_string());
        page.maximized = true;
        Ok(())
    }

    async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
        let mut page = self.lock();
        page.tick();
        page.ensure_unblocked()?;
        Ok(page
            .matches(locator)
            .enumerate()
            .map(|(index, e)| {
                ElementHandle::new(e.locator.clone(), e.tag_name.clone())
                    .at(index)
                    .with_text(e.text.clone())
                    .with_visible(e.visible)
            })
            .collect())
    }

    async fn click(&mut self, element: &ElementHandle) -> ProbeResult<()> {
        let mut page = self.lock();
        page.ensure_unblocked()?;
        let _ = page.resolve_mut(element)?;
        page.history.push(format!("click:{}", element.locator));
        let reaction = page.reactions.get(&element.locator).cloned();
        if let Some(reaction) = reaction {
            reaction(&mut *page);
        }
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        let mut page = self.lock();
        page.ensure_unblocked()?;
        page.resolve_mut(element)?.value.push_str(text);
        page.history
            .push(format!("type:{}:{text}", element.locator));
        Ok(())
    }

    async fn page_source(&self) -> ProbeResult<String> {
        let mut page = self.lock();
        page.tick();
        page.ensure_unblocked()?;
        Ok(page.render_source())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn current_dialog(&self) -> ProbeResult<Option<Dialog>> {
        let mut page = self.lock();
        page.tick();
        Ok(page.dialog.clone())
    }

    async fn handle_dialog(&mut self, action: DialogAction) -> ProbeResult<Dialog> {
        let mut page = self.lock();
        let dialog = page.dialog.take().ok_or(ProbeError::NoDialog)?;
        let verb = if action.accepts() { "accept" } else { "dismiss" };
        page.history.push(format!("dialog:{verb}"));
        Ok(dialog)
    }

    async fn close(&mut self) -> ProbeResult<()> {
        let mut page = self.lock();
        page.close_count += 1;
        page.history.push("close".to_string());
        if page.fail_close {
            return Err(ProbeError::page("mock browser did not exit"));
        }
        Ok(())
    }
}

type PageFactory = Arc<dyn Fn() -> MockPage + Send + Sync>;

/// Launcher handing out a fresh [`MockDriver`] per session
#[derive(Clone)]
pub struct MockLauncher {
    factory: PageFactory,
    launched: Arc<Mutex<Vec<MockDriver>>>,
    fail_launch: bool,
}

impl fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLauncher")
            .field("launched", &self.launch_count())
            .field("fail_launch", &self.fail_launch)
            .finish_non_exhaustive()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new(MockPage::new)
    }
}

impl MockLauncher {
    /// Create a launcher building each page with `factory`
    #[must_use]
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> MockPage + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            launched: Arc::new(Mutex::new(Vec::new())),
            fail_launch: false,
        }
    }

    /// Make every launch fail
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Drivers launched so far, oldest first
    #[must_use]
    pub fn drivers(&self) -> Vec<MockDriver> {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of successful launches
    #[must_use]
    pub fn launch_count(&self) -> usize {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl DriverLauncher for MockLauncher {
    async fn launch(&self) -> ProbeResult<Box<dyn BrowserDriver>> {
        if self.fail_launch {
            return Err(ProbeError::BrowserLaunch {
                message: "mock launcher configured to fail".to_string(),
            });
        }
        let driver = MockDriver::from_page((self.factory)());
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(driver.clone());
        Ok(Box::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod page_tests {
        use super::*;

        #[test]
        fn test_insert_remove() {
            let mut page = MockPage::new();
            page.insert(MockElement::new(Locator::link_text("Delete"), "a"));
            page.insert(MockElement::new(Locator::link_text("Delete"), "a"));
            page.insert(MockElement::new(Locator::id("tbodyid"), "tbody"));
            assert_eq!(page.remove(&Locator::link_text("Delete")), 2);
            assert!(page.element(&Locator::id("tbodyid")).is_some());
        }

        #[test]
        fn test_render_source_includes_hidden_elements() {
            let mut page = MockPage::new();
            page.insert(
                MockElement::new(Locator::id("nameofuser"), "a")
                    .with_text("Welcome x")
                    .hidden(),
            );
            page.insert(MockElement::new(Locator::class_name("sweet-alert"), "div"));
            let source = page.render_source();
            assert!(source.contains(r#"<a id="nameofuser" style="display: none;">Welcome x</a>"#));
            assert!(source.contains(r#"<div class="sweet-alert">"#));
        }

        #[test]
        fn test_deferred_effect_runs_after_observations() {
            let mut page = MockPage::new();
            page.after(2, |p| p.insert(MockElement::new(Locator::id("late"), "div")));
            page.tick();
            assert!(page.element(&Locator::id("late")).is_none());
            page.tick();
            assert!(page.element(&Locator::id("late")).is_some());
        }

        #[test]
        fn test_deferred_effect_can_chain() {
            let mut page = MockPage::new();
            page.after(1, |p| {
                p.after(1, |p| p.open_dialog(Dialog::alert("done")));
            });
            page.tick();
            assert!(page.dialog().is_none());
            page.tick();
            assert_eq!(page.dialog().map(Dialog::message), Some("done"));
        }
    }

    mod driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_fires_reaction() {
            let mut driver = MockDriver::new();
            driver.with_page(|page| {
                page.insert(MockElement::new(Locator::id("login2"), "a"));
                page.on_click(Locator::id("login2"), |p| {
                    p.insert(MockElement::new(Locator::id("loginusername"), "input"));
                });
            });
            let link = driver.find_element(&Locator::id("login2")).await.unwrap();
            driver.click(&link).await.unwrap();
            assert!(driver.find_element(&Locator::id("loginusername")).await.is_ok());
            assert!(driver.was_called("click:id=login2"));
        }

        #[tokio::test]
        async fn test_send_keys_appends_value() {
            let mut driver = MockDriver::new();
            driver.with_page(|page| page.insert(MockElement::new(Locator::id("name"), "input")));
            let input = driver.find_element(&Locator::id("name")).await.unwrap();
            driver.send_keys(&input, "John").await.unwrap();
            driver.send_keys(&input, " Doe").await.unwrap();
            let value = driver.with_page(|p| p.value_of(&Locator::id("name")).map(str::to_owned));
            assert_eq!(value.as_deref(), Some("John Doe"));
        }

        #[tokio::test]
        async fn test_stale_handle_is_not_found() {
            let mut driver = MockDriver::new();
            driver.with_page(|page| page.insert(MockElement::new(Locator::id("gone"), "a")));
            let handle = driver.find_element(&Locator::id("gone")).await.unwrap();
            driver.with_page(MockPage::clear);
            let err = driver.click(&handle).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_open_dialog_blocks_page_access() {
            let driver = MockDriver::new();
            driver.with_page(|page| page.open_dialog(Dialog::alert("Product added.")));
            let err = driver.page_source().await.unwrap_err();
            assert!(matches!(err, ProbeError::DialogBlocking { .. }));
            let dialog = driver.current_dialog().await.unwrap();
            assert_eq!(dialog.map(|d| d.message().to_string()).as_deref(), Some("Product added."));
        }

        #[tokio::test]
        async fn test_handle_dialog_without_dialog_fails_loud() {
            let mut driver = MockDriver::new();
            let err = driver.accept_dialog().await.unwrap_err();
            assert!(matches!(err, ProbeError::NoDialog));
            assert!(!driver.was_called("dialog:"));
        }

        #[tokio::test]
        async fn test_close_counts_and_fails_on_request() {
            let mut driver = MockDriver::new();
            driver.with_page(MockPage::fail_close);
            assert!(driver.close().await.is_err());
            assert_eq!(driver.close_count(), 1);
        }
    }

    mod launcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_each_launch_gets_fresh_page() {
            let launcher = MockLauncher::new(|| {
                let mut page = MockPage::new();
                page.insert(MockElement::new(Locator::id("cartur"), "a"));
                page
            });
            let mut first = launcher.launch().await.unwrap();
            let _second = launcher.launch().await.unwrap();
            first.navigate("https://example.test/").await.unwrap();

            let drivers = launcher.drivers();
            assert_eq!(drivers.len(), 2);
            assert!(drivers[0].was_called("navigate"));
            assert!(!drivers[1].was_called("navigate"));
        }

        #[tokio::test]
        async fn test_failing_launcher() {
            let launcher = MockLauncher::default().failing();
            let err = launcher.launch().await.unwrap_err();
            assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
            assert_eq!(launcher.launch_count(), 0);
        }
    }
}
