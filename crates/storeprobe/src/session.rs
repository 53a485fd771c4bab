//! Session fixture: one browser per scenario with guaranteed release.
//!
//! [`SessionFixture::acquire`] launches a browser, maximizes it and opens the
//! base URL. [`Session::release`] consumes the session, so a session can be
//! closed at most once. [`SessionFixture::run`] pairs the two around a
//! [`SessionTask`] and releases on every exit path, panics included.

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, info, warn};

use crate::dialog::Dialog;
use crate::driver::{BrowserDriver, DriverLauncher, ElementHandle};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{Satisfied, WaitCondition, WaitOptions, Waiter};

/// How an element is looked up before an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    /// Wait for the element to be present first
    #[default]
    Waited,
    /// Look it up once; fail if absent
    Direct,
}

/// A browser instance owned by one running scenario
#[derive(Debug)]
pub struct Session {
    driver: Box<dyn BrowserDriver>,
    base_url: String,
    waiter: Waiter,
}

impl Session {
    /// Wrap an already-prepared driver
    #[must_use]
    pub fn new(driver: Box<dyn BrowserDriver>, base_url: impl Into<String>, waiter: Waiter) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            waiter,
        }
    }

    /// The base URL the session was opened on
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The session's wait policy
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Shared access to the driver
    #[must_use]
    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    /// Exclusive access to the driver
    pub fn driver_mut(&mut self) -> &mut dyn BrowserDriver {
        self.driver.as_mut()
    }

    /// Poll a condition under the session's wait policy
    pub async fn wait_until(&self, condition: &WaitCondition) -> ProbeResult<Satisfied> {
        self.waiter.until(self.driver.as_ref(), condition).await
    }

    /// Find an element, waiting for it or not
    pub async fn lookup(&self, locator: &Locator, lookup: Lookup) -> ProbeResult<ElementHandle> {
        match lookup {
            Lookup::Waited => self
                .wait_until(&WaitCondition::present(locator.clone()))
                .await?
                .into_element()
                .ok_or_else(|| ProbeError::element_not_found(locator)),
            Lookup::Direct => self.driver.find_element(locator).await,
        }
    }

    /// Look up and click an element
    pub async fn click(&mut self, locator: &Locator, lookup: Lookup) -> ProbeResult<()> {
        let element = self.lookup(locator, lookup).await?;
        self.driver.click(&element).await
    }

    /// Look up an element and type into it
    pub async fn type_text(&mut self, locator: &Locator, text: &str, lookup: Lookup) -> ProbeResult<()> {
        let element = self.lookup(locator, lookup).await?;
        self.driver.send_keys(&element, text).await
    }

    /// The native dialog currently displayed, if any
    pub async fn current_dialog(&self) -> ProbeResult<Option<Dialog>> {
        self.driver.current_dialog().await
    }

    /// Accept the displayed native dialog
    pub async fn accept_dialog(&mut self) -> ProbeResult<Dialog> {
        self.driver.accept_dialog().await
    }

    /// Dismiss the displayed native dialog
    pub async fn dismiss_dialog(&mut self) -> ProbeResult<Dialog> {
        self.driver.dismiss_dialog().await
    }

    /// Serialized DOM of the current page
    pub async fn page_source(&self) -> ProbeResult<String> {
        self.driver.page_source().await
    }

    /// Close the browser
    pub async fn release(mut self) -> ProbeResult<()> {
        debug!(base_url = %self.base_url, "releasing session");
        self.driver.close().await
    }
}

/// Work run inside a fixture-managed session
#[async_trait]
pub trait SessionTask: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Run against a freshly acquired session
    async fn run(&self, session: &mut Session) -> ProbeResult<()>;
}

/// Creates and tears down sessions
#[derive(Debug, Clone)]
pub struct SessionFixture<L> {
    launcher: L,
    base_url: String,
    wait: WaitOptions,
}

impl<L: DriverLauncher> SessionFixture<L> {
    /// Create a fixture
    #[must_use]
    pub fn new(launcher: L, base_url: impl Into<String>) -> Self {
        Self {
            launcher,
            base_url: base_url.into(),
            wait: WaitOptions::default(),
        }
    }

    /// Set the wait policy handed to each session
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Get the launcher
    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Launch a browser, maximize it and open the base URL.
    ///
    /// If preparation fails after launch, the browser is closed before the
    /// error is returned.
    pub async fn acquire(&self) -> ProbeResult<Session> {
        let mut driver = self.launcher.launch().await?;
        if let Err(err) = prepare(driver.as_mut(), &self.base_url).await {
            if let Err(close_err) = driver.close().await {
                warn!(error = %close_err, "closing browser after failed setup");
            }
            return Err(err);
        }
        Ok(Session::new(driver, self.base_url.clone(), Waiter::with_options(self.wait)))
    }

    /// Run `task` in a fresh session and release it on every exit path.
    ///
    /// A teardown failure after a failed task is attached to the task's
    /// error as [`ProbeError::TeardownAfterFailure`].
    /// A teardown failure after a passing task fails the run.
    pub async fn run(&self, task: &dyn SessionTask) -> ProbeResult<()> {
        let mut session = self.acquire().await?;
        info!(task = task.name(), "session acquired");

        let outcome = AssertUnwindSafe(task.run(&mut session))
            .catch_unwind()
            .await;
        let released = session.release().await;

        match (outcome, released) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(ProbeError::fixture(format!("teardown failed: {err}"))),
            (Ok(Err(err)), released) => Err(with_teardown(task.name(), err, released)),
            (Err(payload), released) => {
                let panicked = ProbeError::Panicked {
                    message: panic_message(payload.as_ref()),
                };
                Err(with_teardown(task.name(), panicked, released))
            }
        }
    }
}

/// Attach a failed close to the task's own failure.
fn with_teardown(task: &str, err: ProbeError, released: ProbeResult<()>) -> ProbeError {
    match released {
        Ok(()) => err,
        Err(close_err) => {
            warn!(task, error = %close_err, "teardown failed after task failure");
            ProbeError::TeardownAfterFailure {
                teardown: close_err.to_string(),
                source: Box::new(err),
            }
        }
    }
}

async fn prepare(driver: &mut dyn BrowserDriver, base_url: &str) -> ProbeResult<()> {
    driver.maximize().await?;
    driver.navigate(base_url).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockLauncher, MockPage};

    const BASE: &str = "https://shop.test/";

    struct Body<F>(F);

    #[async_trait]
    impl<F> SessionTask for Body<F>
    where
        F: Fn(&mut Session) -> ProbeResult<()> + Send + Sync,
    {
        fn name(&self) -> &str {
            "body"
        }

        async fn run(&self, session: &mut Session) -> ProbeResult<()> {
            (self.0)(session)
        }
    }

    struct ClickCart;

    #[async_trait]
    impl SessionTask for ClickCart {
        fn name(&self) -> &str {
            "click_cart"
        }

        async fn run(&self, session: &mut Session) -> ProbeResult<()> {
            session.click(&Locator::id("cartur"), Lookup::Waited).await
        }
    }

    fn with_cart_link() -> MockPage {
        let mut page = MockPage::new();
        page.insert(MockElement::new(Locator::id("cartur"), "a"));
        page
    }

    fn fixture(launcher: MockLauncher) -> SessionFixture<MockLauncher> {
        SessionFixture::new(launcher, BASE)
            .with_wait(WaitOptions::new().with_timeout(100).with_poll_interval(10))
    }

    mod acquire_tests {
        use super::*;

        #[tokio::test]
        async fn test_acquire_maximizes_then_navigates() {
            let fixture = fixture(MockLauncher::default());
            let session = fixture.acquire().await.unwrap();
            assert_eq!(session.base_url(), BASE);
            assert_eq!(session.driver().current_url().await.unwrap(), BASE);

            let drivers = fixture.launcher().drivers();
            let driver = &drivers[0];
            assert_eq!(driver.history(), vec!["maximize".to_string(), format!("navigate:{BASE}")]);
            assert!(driver.with_page(|p| p.is_maximized()));
            session.release().await.unwrap();
            assert_eq!(driver.close_count(), 1);
        }

        #[tokio::test]
        async fn test_driver_mut_drives_the_session_browser() {
            let fixture = fixture(MockLauncher::default());
            let mut session = fixture.acquire().await.unwrap();
            let cart = format!("{BASE}cart.html");
            session.driver_mut().navigate(&cart).await.unwrap();
            assert_eq!(session.driver().current_url().await.unwrap(), cart);
            session.release().await.unwrap();
        }

        #[tokio::test]
        async fn test_launch_failure_is_not_retried() {
            let fixture = fixture(MockLauncher::default().failing());
            let err = fixture.acquire().await.unwrap_err();
            assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
            assert_eq!(fixture.launcher().launch_count(), 0);
        }

        #[tokio::test]
        async fn test_navigation_failure_closes_browser() {
            let fixture = fixture(MockLauncher::new(|| {
                let mut page = MockPage::new();
                page.fail_navigation();
                page
            }));
            let err = fixture.acquire().await.unwrap_err();
            assert!(matches!(err, ProbeError::Navigation { .. }));
            assert_eq!(fixture.launcher().drivers()[0].close_count(), 1);
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_release_after_success() {
            let fixture = fixture(MockLauncher::new(with_cart_link));
            fixture.run(&ClickCart).await.unwrap();
            let drivers = fixture.launcher().drivers();
            let driver = &drivers[0];
            assert!(driver.was_called("click:id=cartur"));
            assert_eq!(driver.close_count(), 1);
        }

        #[tokio::test]
        async fn test_release_after_failure() {
            let fixture = fixture(MockLauncher::default());
            let err = fixture.run(&ClickCart).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
            assert_eq!(fixture.launcher().drivers()[0].close_count(), 1);
        }

        #[tokio::test]
        async fn test_release_after_panic() {
            let fixture = fixture(MockLauncher::default());
            let body = Body(|_: &mut Session| -> ProbeResult<()> { panic!("boom at step 3") });
            let err = fixture.run(&body).await.unwrap_err();
            assert!(matches!(err, ProbeError::Panicked { ref message } if message == "boom at step 3"));
            assert_eq!(fixture.launcher().drivers()[0].close_count(), 1);
        }

        #[tokio::test]
        async fn test_teardown_failure_after_pass_fails_run() {
            let fixture = fixture(MockLauncher::new(|| {
                let mut page = with_cart_link();
                page.fail_close();
                page
            }));
            let err = fixture.run(&ClickCart).await.unwrap_err();
            assert!(matches!(err, ProbeError::Fixture { ref message } if message.contains("teardown")));
        }

        #[tokio::test]
        async fn test_task_error_carries_teardown_error() {
            let fixture = fixture(MockLauncher::new(|| {
                let mut page = MockPage::new();
                page.fail_close();
                page
            }));
            let body = Body(|_: &mut Session| -> ProbeResult<()> { Err(ProbeError::NoDialog) });
            let err = fixture.run(&body).await.unwrap_err();
            assert!(matches!(err, ProbeError::TeardownAfterFailure { ref teardown, .. } if teardown.contains("did not exit")));
            assert!(matches!(err.root_cause(), ProbeError::NoDialog));
        }

        #[tokio::test]
        async fn test_panic_carries_teardown_error() {
            let fixture = fixture(MockLauncher::new(|| {
                let mut page = MockPage::new();
                page.fail_close();
                page
            }));
            let body = Body(|_: &mut Session| -> ProbeResult<()> { panic!("lost the page") });
            let err = fixture.run(&body).await.unwrap_err();
            assert!(matches!(
                err.root_cause(),
                ProbeError::Panicked { message } if message == "lost the page"
            ));
            assert!(err.to_string().contains("teardown also failed"));
        }

        #[tokio::test]
        async fn test_each_run_gets_fresh_session() {
            let fixture = fixture(MockLauncher::new(with_cart_link));
            fixture.run(&ClickCart).await.unwrap();
            fixture.run(&ClickCart).await.unwrap();
            let drivers = fixture.launcher().drivers();
            assert_eq!(drivers.len(), 2);
            for driver in drivers {
                assert_eq!(driver.close_count(), 1);
                assert_eq!(
                    driver.history().iter().filter(|c| c.starts_with("click:")).count(),
                    1
                );
            }
        }
    }

    mod lookup_tests {
        use super::*;

        #[tokio::test]
        async fn test_direct_lookup_fails_without_waiting() {
            let fixture = SessionFixture::new(MockLauncher::default(), BASE)
                .with_wait(WaitOptions::new().with_timeout(5_000));
            let mut session = fixture.acquire().await.unwrap();
            let started = std::time::Instant::now();
            let err = session
                .type_text(&Locator::id("loginpassword"), "x", Lookup::Direct)
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
            assert!(started.elapsed() < std::time::Duration::from_secs(1));
            session.release().await.unwrap();
        }

        #[tokio::test]
        async fn test_waited_lookup_absorbs_late_element() {
            let fixture = fixture(MockLauncher::new(|| {
                let mut page = MockPage::new();
                page.after(3, |p| p.insert(MockElement::new(Locator::id("loginusername"), "input")));
                page
            }));
            let mut session = fixture.acquire().await.unwrap();
            session
                .type_text(&Locator::id("loginusername"), "gopi_test", Lookup::Waited)
                .await
                .unwrap();
            assert!(fixture.launcher().drivers()[0].was_called("type:id=loginusername:gopi_test"));
            session.release().await.unwrap();
        }
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
