//! Sequential suite runner.
//!
//! Scenarios run one after another, each in a fresh session from the
//! fixture. A failing scenario never stops the next one from acquiring its
//! own browser unless fail-fast is set.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::driver::DriverLauncher;
use crate::result::ProbeError;
use crate::scenario::Scenario;
use crate::session::SessionFixture;

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Whether the scenario passed
    pub passed: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Index of the failing step, when a step failed
    pub failed_step: Option<usize>,
    /// Wall time including session setup and teardown
    pub duration: Duration,
}

impl ScenarioReport {
    /// Create a passing report
    #[must_use]
    pub fn pass(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            error: None,
            failed_step: None,
            duration,
        }
    }

    /// Create a failing report from the scenario's error
    #[must_use]
    pub fn fail(name: impl Into<String>, error: &ProbeError, duration: Duration) -> Self {
        Self {
            name: name.into(),
            passed: false,
            error: Some(error.to_string()),
            failed_step: error.failed_step(),
            duration,
        }
    }
}

/// Aggregated scenario reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Reports in run order
    pub scenarios: Vec<ScenarioReport>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scenario report
    pub fn add(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed).count()
    }

    /// Number of failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|r| !r.passed).count()
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(|r| r.passed)
    }

    /// Failed scenario reports
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|r| !r.passed).collect()
    }

    /// Names of the failed scenarios
    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failures().into_iter().map(|r| r.name.as_str()).collect()
    }
}

/// Progress notifications from [`SuiteRunner::run`]
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// A scenario is about to acquire its session
    Started {
        /// Scenario name
        name: &'a str,
        /// Zero-based position in the run
        index: usize,
        /// Number of scenarios selected
        total: usize,
    },
    /// A scenario finished and its session was released
    Finished(&'a ScenarioReport),
}

/// Runs scenarios through a [`SessionFixture`]
#[derive(Debug)]
pub struct SuiteRunner<L> {
    fixture: SessionFixture<L>,
    fail_fast: bool,
}

impl<L: DriverLauncher> SuiteRunner<L> {
    /// Create a runner
    #[must_use]
    pub const fn new(fixture: SessionFixture<L>) -> Self {
        Self {
            fixture,
            fail_fast: false,
        }
    }

    /// Stop after the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Get the fixture
    #[must_use]
    pub const fn fixture(&self) -> &SessionFixture<L> {
        &self.fixture
    }

    /// Run `scenarios` in order, reporting progress to `observer`
    pub async fn run<F>(&self, scenarios: &[Scenario], mut observer: F) -> SuiteReport
    where
        F: FnMut(RunEvent<'_>),
    {
        let start = Instant::now();
        let mut report = SuiteReport::new();
        let total = scenarios.len();

        for (index, scenario) in scenarios.iter().enumerate() {
            observer(RunEvent::Started {
                name: scenario.name(),
                index,
                total,
            });

            let scenario_start = Instant::now();
            let outcome = self.fixture.run(scenario).await;
            let elapsed = scenario_start.elapsed();
            let result = match outcome {
                Ok(()) => ScenarioReport::pass(scenario.name(), elapsed),
                Err(err) => {
                    warn!(scenario = scenario.name(), error = %err, "scenario failed");
                    ScenarioReport::fail(scenario.name(), &err, elapsed)
                }
            };

            observer(RunEvent::Finished(&result));
            let stop = self.fail_fast && !result.passed;
            report.add(result);
            if stop {
                info!(remaining = total - index - 1, "fail-fast: skipping remaining scenarios");
                break;
            }
        }

        report.duration = start.elapsed();
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "suite finished"
        );
        report
    }
}

/// Keep the scenarios whose name contains `filter`
#[must_use]
pub fn select(scenarios: Vec<Scenario>, filter: Option<&str>) -> Vec<Scenario> {
    match filter {
        Some(pattern) => scenarios
            .into_iter()
            .filter(|s| s.name().contains(pattern))
            .collect(),
        None => scenarios,
    }
}
