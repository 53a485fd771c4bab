//! storeprobe: end-to-end browser scenarios for the demoblaze storefront
//!
//! Each scenario is a straight line of locate → act → wait → assert steps run
//! in its own browser session. Sessions come from a [`SessionFixture`] that
//! guarantees the browser is closed whatever the scenario does.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    storeprobe Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Session    │    │ Browser    │            │
//! │   │ (Steps)    │───►│ + Waiter   │───►│ Driver     │            │
//! │   │            │    │            │    │ (CDP/mock) │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                 ▲                                     │
//! │   ┌─────┴──────┐    ┌─────┴──────┐                              │
//! │   │ Storefront │    │ Suite      │                              │
//! │   │ catalog    │    │ Runner     │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use storeprobe::{storefront, MockLauncher, SessionFixture, StorefrontData, SuiteRunner};
//!
//! # async fn demo() {
//! let fixture = SessionFixture::new(MockLauncher::default(), storefront::BASE_URL);
//! let scenarios = storefront::all(&StorefrontData::default());
//! let report = SuiteRunner::new(fixture).run(&scenarios, |_| {}).await;
//! println!("{} passed, {} failed", report.passed(), report.failed());
//! # }
//! ```

#![warn(missing_docs)]

mod browser;
mod config;
mod dialog;
mod driver;
mod locator;
mod result;
mod runner;
mod scenario;
mod session;
mod wait;

/// In-memory driver for offline runs
pub mod mock;

/// Demoblaze identifiers and the five scenarios
pub mod storefront;

#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumLauncher};
pub use browser::{BrowserConfig, DEFAULT_COMMAND_TIMEOUT_MS};
pub use config::SuiteConfig;
pub use dialog::{Dialog, DialogAction, DialogType};
pub use driver::{BrowserDriver, DriverLauncher, ElementHandle};
pub use locator::{xpath_literal, Locator, Strategy};
pub use mock::{MockDriver, MockElement, MockLauncher, MockPage};
pub use result::{ProbeError, ProbeResult};
pub use runner::{select, RunEvent, ScenarioReport, SuiteReport, SuiteRunner};
pub use scenario::{Scenario, Step};
pub use session::{Lookup, Session, SessionFixture, SessionTask};
pub use storefront::{OrderForm, StorefrontData};
pub use wait::{
    Satisfied, WaitCondition, WaitOptions, Waiter, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::dialog::*;
    pub use super::driver::*;
    pub use super::locator::*;
    pub use super::mock::*;
    pub use super::result::*;
    pub use super::runner::*;
    pub use super::scenario::*;
    pub use super::session::*;
    pub use super::storefront::{OrderForm, StorefrontData};
    pub use super::wait::*;
}
