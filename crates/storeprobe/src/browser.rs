//! Browser control over the Chrome `DevTools` Protocol.
//!
//! [`BrowserConfig`] is always available so configuration files parse in
//! every build. The CDP-backed [`ChromiumDriver`] and [`ChromiumLauncher`]
//! need the `browser` feature (chromiumoxide).
//!
//! Element lookups run as `document.evaluate` snapshots over the locator's
//! XPath. Clicks are dispatched from a zero-delay timer so a click that opens
//! a native `alert` returns instead of stalling the evaluation, and an open
//! dialog is tracked from `Page.javascriptDialogOpening` events.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-command timeout for CDP calls (30 seconds)
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Upper bound for a single CDP round trip, in milliseconds
    pub command_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            sandbox: true,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
        }
    }
}

impl BrowserConfig {
    /// Set window dimensions
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the per-command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout_ms: u64) -> Self {
        self.command_timeout_ms = timeout_ms;
        self
    }

    /// Per-command timeout as Duration
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// JS snapshot of the elements matching an XPath.
///
/// Yields `[{tag, text, visible}]` in document order, skipping non-element
/// nodes.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn find_script(xpath: &str) -> String {
    format!(
        r"(() => {{
  const snap = document.evaluate({xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  const out = [];
  for (let i = 0; i < snap.snapshotLength; i++) {{
    const el = snap.snapshotItem(i);
    if (el.nodeType !== Node.ELEMENT_NODE) continue;
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    out.push({{
      tag: el.tagName.toLowerCase(),
      text: el.innerText ?? el.textContent ?? '',
      visible: rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none',
    }});
  }}
  return out;
}})()",
        xpath = js_string(xpath)
    )
}

/// JS resolving the `index`-th element match and running `action` on `el`.
///
/// Evaluates to `false` when the element is gone.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn element_script(xpath: &str, index: usize, action: &str) -> String {
    format!(
        r"(() => {{
  const snap = document.evaluate({xpath}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  const els = [];
  for (let i = 0; i < snap.snapshotLength; i++) {{
    const node = snap.snapshotItem(i);
    if (node.nodeType === Node.ELEMENT_NODE) els.push(node);
  }}
  const el = els[{index}];
  if (!el) return false;
  {action}
  return true;
}})()",
        xpath = js_string(xpath)
    )
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn click_action() -> &'static str {
    "el.scrollIntoView({block: 'center'}); setTimeout(() => el.click(), 0);"
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
fn type_action(text: &str) -> String {
    format!(
        "el.focus(); el.value = (el.value ?? '') + {text}; \
         el.dispatchEvent(new Event('input', {{bubbles: true}})); \
         el.dispatchEvent(new Event('change', {{bubbles: true}}));",
        text = js_string(text)
    )
}

/// Quote `s` as a JS string literal (JSON is a subset of JS).
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::{click_action, element_script, find_script, type_action, BrowserConfig};
    use crate::dialog::{Dialog, DialogAction, DialogType};
    use crate::driver::{BrowserDriver, DriverLauncher, ElementHandle};
    use crate::locator::Locator;
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::{
        Bounds, GetWindowForTargetParams, SetWindowBoundsParams, WindowState,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        DialogType as CdpDialogType, EventJavascriptDialogClosed, EventJavascriptDialogOpening,
        HandleJavaScriptDialogParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use std::fmt;
    use std::future::Future;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    type DialogSlot = Arc<Mutex<Option<Dialog>>>;

    #[derive(Debug, Deserialize)]
    struct RawElement {
        tag: String,
        text: String,
        visible: bool,
    }

    /// Browser instance with real CDP connection
    pub struct ChromiumDriver {
        config: BrowserConfig,
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        dialog: DialogSlot,
        tasks: Vec<JoinHandle<()>>,
        closed: bool,
    }

    impl fmt::Debug for ChromiumDriver {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ChromiumDriver")
                .field("config", &self.config)
                .field("tasks", &self.tasks.len())
                .field("closed", &self.closed)
                .finish_non_exhaustive()
        }
    }

    fn launch_error(e: impl fmt::Display) -> ProbeError {
        ProbeError::BrowserLaunch {
            message: e.to_string(),
        }
    }

    #[allow(unreachable_patterns)]
    fn dialog_kind(kind: &CdpDialogType) -> DialogType {
        match kind {
            CdpDialogType::Alert => DialogType::Alert,
            CdpDialogType::Confirm => DialogType::Confirm,
            CdpDialogType::Prompt => DialogType::Prompt,
            CdpDialogType::Beforeunload => DialogType::BeforeUnload,
            _ => DialogType::Alert,
        }
    }

    impl ChromiumDriver {
        /// Launch a new browser instance with one blank tab
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> ProbeResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.window_width, config.window_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(launch_error)?;
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;

            let mut tasks = vec![tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            })];

            let page = match browser.new_page("about:blank").await {
                Ok(page) => page,
                Err(e) => {
                    for task in &tasks {
                        task.abort();
                    }
                    return Err(launch_error(e));
                }
            };

            let dialog: DialogSlot = Arc::new(Mutex::new(None));
            match Self::listen_for_dialogs(&page, &dialog).await {
                Ok(listeners) => tasks.extend(listeners),
                Err(e) => {
                    for task in &tasks {
                        task.abort();
                    }
                    return Err(e);
                }
            }

            info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                browser: Mutex::new(browser),
                page,
                dialog,
                tasks,
                closed: false,
            })
        }

        async fn listen_for_dialogs(
            page: &CdpPage,
            slot: &DialogSlot,
        ) -> ProbeResult<Vec<JoinHandle<()>>> {
            let mut opened = page
                .event_listener::<EventJavascriptDialogOpening>()
                .await
                .map_err(launch_error)?;
            let mut closed = page
                .event_listener::<EventJavascriptDialogClosed>()
                .await
                .map_err(launch_error)?;

            let on_open = Arc::clone(slot);
            let open_task = tokio::spawn(async move {
                while let Some(event) = opened.next().await {
                    debug!(message = %event.message, "native dialog opened");
                    *on_open.lock().await =
                        Some(Dialog::new(dialog_kind(&event.r#type), event.message.clone()));
                }
            });

            let on_close = Arc::clone(slot);
            let close_task = tokio::spawn(async move {
                while closed.next().await.is_some() {
                    *on_close.lock().await = None;
                }
            });

            Ok(vec![open_task, close_task])
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        async fn bounded<T, E, F>(&self, what: &str, fut: F) -> ProbeResult<T>
        where
            F: Future<Output = Result<T, E>> + Send,
            E: fmt::Display,
        {
            match tokio::time::timeout(self.config.command_timeout(), fut).await {
                Ok(result) => result.map_err(|e| ProbeError::page(format!("{what}: {e}"))),
                Err(_) => Err(ProbeError::page(format!(
                    "{what}: no response within {}ms",
                    self.config.command_timeout_ms
                ))),
            }
        }

        async fn ensure_unblocked(&self) -> ProbeResult<()> {
            match self.dialog.lock().await.as_ref() {
                Some(dialog) => Err(ProbeError::DialogBlocking {
                    kind: dialog.kind().to_string(),
                    message: dialog.message().to_string(),
                }),
                None => Ok(()),
            }
        }

        async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            self.ensure_unblocked().await?;
            let result = self.bounded("evaluate", self.page.evaluate(script)).await?;
            result
                .into_value()
                .map_err(|e| ProbeError::page(format!("decode script result: {e}")))
        }

        async fn on_element(&self, element: &ElementHandle, action: &str) -> ProbeResult<()> {
            let script = element_script(&element.locator.to_xpath(), element.index, action);
            if self.eval::<bool>(script).await? {
                Ok(())
            } else {
                Err(ProbeError::element_not_found(&element.locator))
            }
        }
    }

    #[async_trait]
    impl BrowserDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
            debug!(url, "navigate");
            match tokio::time::timeout(self.config.command_timeout(), self.page.goto(url)).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(ProbeError::Navigation {
                    url: url.to_string(),
                    message: format!("no load within {}ms", self.config.command_timeout_ms),
                }),
            }
        }

        async fn maximize(&mut self) -> ProbeResult<()> {
            if self.config.headless {
                debug!("headless window keeps its launch size");
                return Ok(());
            }
            let window = self
                .bounded("get window", self.page.execute(GetWindowForTargetParams::default()))
                .await?;
            let bounds = Bounds::builder().window_state(WindowState::Maximized).build();
            self.bounded(
                "maximize window",
                self.page
                    .execute(SetWindowBoundsParams::new(window.result.window_id.clone(), bounds)),
            )
            .await?;
            Ok(())
        }

        async fn find_elements(&self, locator: &Locator) -> ProbeResult<Vec<ElementHandle>> {
            let raw: Vec<RawElement> = self.eval(find_script(&locator.to_xpath())).await?;
            Ok(raw
                .into_iter()
                .enumerate()
                .map(|(index, el)| {
                    ElementHandle::new(locator.clone(), el.tag)
                        .at(index)
                        .with_text(el.text)
                        .with_visible(el.visible)
                })
                .collect())
        }

        async fn click(&mut self, element: &ElementHandle) -> ProbeResult<()> {
            debug!(locator = %element.locator, "click");
            self.on_element(element, click_action()).await?;
            // Let the queued click run before the next probe.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(())
        }

        async fn send_keys(&mut self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
            debug!(locator = %element.locator, "type");
            self.on_element(element, &type_action(text)).await
        }

        async fn page_source(&self) -> ProbeResult<String> {
            self.eval("document.documentElement.outerHTML".to_string())
                .await
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let url = self.bounded("url", self.page.url()).await?;
            Ok(url.unwrap_or_default())
        }

        async fn current_dialog(&self) -> ProbeResult<Option<Dialog>> {
            Ok(self.dialog.lock().await.clone())
        }

        async fn handle_dialog(&mut self, action: DialogAction) -> ProbeResult<Dialog> {
            let dialog = self.dialog.lock().await.clone().ok_or(ProbeError::NoDialog)?;
            self.bounded(
                "handle dialog",
                self.page
                    .execute(HandleJavaScriptDialogParams::new(action.accepts())),
            )
            .await?;
            *self.dialog.lock().await = None;
            debug!(kind = %dialog.kind(), ?action, "native dialog handled");
            Ok(dialog)
        }

        async fn close(&mut self) -> ProbeResult<()> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            let mut browser = self.browser.lock().await;
            let closed = browser.close().await;
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "browser process did not exit cleanly");
            }
            for task in &self.tasks {
                task.abort();
            }
            info!("browser closed");
            closed.map(drop).map_err(|e| ProbeError::page(format!("close browser: {e}")))
        }
    }

    /// Launches a fresh chromium per session
    #[derive(Debug, Clone, Default)]
    pub struct ChromiumLauncher {
        config: BrowserConfig,
    }

    impl ChromiumLauncher {
        /// Create a launcher
        #[must_use]
        pub const fn new(config: BrowserConfig) -> Self {
            Self { config }
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }
    }

    #[async_trait]
    impl DriverLauncher for ChromiumLauncher {
        async fn launch(&self) -> ProbeResult<Box<dyn BrowserDriver>> {
            Ok(Box::new(ChromiumDriver::launch(self.config.clone()).await?))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher};

#[cfg(test)]
mod tests {
    use super::*;

    mod config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = BrowserConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!((config.window_width, config.window_height), (1920, 1080));
            assert_eq!(config.command_timeout(), Duration::from_secs(30));
        }

        #[test]
        fn test_builders() {
            let config = BrowserConfig::default()
                .with_headless(false)
                .with_window(1280, 720)
                .with_chromium_path("/usr/bin/chromium")
                .with_no_sandbox()
                .with_command_timeout(5_000);
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.window_width, 1280);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
            assert_eq!(config.command_timeout_ms, 5_000);
        }

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let config: BrowserConfig = serde_yaml_ng::from_str("headless: false\n").unwrap();
            assert!(!config.headless);
            assert_eq!(config.window_width, 1920);
        }
    }

    mod script_tests {
        use super::*;

        #[test]
        fn test_js_string_escapes_quotes() {
            assert_eq!(js_string("//a[text()='Delete']"), r#""//a[text()='Delete']""#);
            assert_eq!(js_string(r#"say "hi""#), r#""say \"hi\"""#);
        }

        #[test]
        fn test_find_script_embeds_xpath_literal() {
            let script = find_script("//*[@id='cartur']");
            assert!(script.contains(r#"document.evaluate("//*[@id='cartur']""#));
            assert!(script.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        }

        #[test]
        fn test_element_script_indexes_matches() {
            let script = element_script("//a", 3, click_action());
            assert!(script.contains("els[3]"));
            assert!(script.contains("setTimeout(() => el.click(), 0)"));
        }

        #[test]
        fn test_type_action_appends() {
            let action = type_action("John \"JD\" Doe");
            assert!(action.contains(r#"(el.value ?? '') + "John \"JD\" Doe""#));
            assert!(action.contains("'input'"));
        }
    }
}
