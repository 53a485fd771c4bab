//! Scenario execution with terminal progress

use storeprobe::{
    DriverLauncher, RunEvent, Scenario, SessionFixture, SuiteConfig, SuiteReport, SuiteRunner,
};

use crate::config::CliConfig;
use crate::output::ProgressReporter;

/// Drives a suite run and reports each scenario as it finishes
#[derive(Debug)]
pub struct ScenarioRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl ScenarioRunner {
    /// Create a new runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let use_color = config.color.should_color();
        let quiet = config.verbosity.is_quiet();
        Self {
            config,
            reporter: ProgressReporter::new(use_color, quiet),
        }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Get the reporter
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// Run `scenarios` with sessions from `launcher`
    pub async fn run<L: DriverLauncher>(
        &mut self,
        launcher: L,
        suite: &SuiteConfig,
        scenarios: &[Scenario],
    ) -> SuiteReport {
        let fixture = SessionFixture::new(launcher, suite.base_url.clone()).with_wait(suite.wait);
        let runner = SuiteRunner::new(fixture).with_fail_fast(suite.fail_fast);

        self.reporter.header("Storefront scenarios");
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!("base url {}", suite.base_url));
        }
        self.reporter
            .start_progress(scenarios.len() as u64, "starting browser");

        let reporter = &self.reporter;
        let report = runner
            .run(scenarios, |event| match event {
                RunEvent::Started { name, .. } => reporter.set_message(name),
                RunEvent::Finished(result) => {
                    reporter.scenario(result);
                    reporter.increment(1);
                }
            })
            .await;

        reporter.finish();
        reporter.summary(
            report.passed(),
            report.failed(),
            scenarios.len().saturating_sub(report.total()),
            report.duration,
        );
        report
    }
}
