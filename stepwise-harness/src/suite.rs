//! Suite runner.
//!
//! Drives a list of scenarios through the lifecycle controller:
//!
//! ```text
//! before_all -> for each scenario { before_scenario -> steps -> after_scenario } -> after_all
//! ```
//!
//! Steps run in order and stop at the first failure; the remaining steps
//! are reported as skipped. Scenario-scoped errors fail only that scenario.
//! Fatal errors (configuration, hook order) abort the suite, and the report
//! records how many scenarios did not run.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use stepwise_core::config::RuntimeParams;
use stepwise_core::driver::DriverSessionManager;
use stepwise_core::error::StepwiseError;
use stepwise_core::lifecycle::LifecycleController;
use stepwise_core::steps::StepRegistry;
use stepwise_core::types::ScenarioInfo;
use stepwise_core::visual::ScreenshotComparator;

use crate::logging::init_project_logging;
use crate::project::Project;
use crate::report::{ScenarioOutcome, StepOutcome, StepStatus, SuiteReport};

/// A scenario to run: its metadata and step texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(flatten)]
    pub info: ScenarioInfo,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl ScenarioSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ScenarioInfo::new(name),
            steps: Vec::new(),
        }
    }

    pub fn tagged<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info = self.info.with_tags(tags);
        self
    }

    pub fn step(mut self, text: impl Into<String>) -> Self {
        self.steps.push(text.into());
        self
    }
}

/// Runs scenarios for one project with one driver.
pub struct Suite<D: DriverSessionManager> {
    controller: LifecycleController<D>,
    steps: StepRegistry,
}

impl<D: DriverSessionManager> Suite<D> {
    pub fn new(project: &Project, driver: D, steps: StepRegistry) -> Self {
        Self {
            controller: LifecycleController::new(project.resolver(), driver),
            steps,
        }
    }

    /// Use a pixel comparison engine for screenshot assertions.
    pub fn with_comparator(mut self, comparator: Box<dyn ScreenshotComparator>) -> Self {
        self.controller = self.controller.with_comparator(comparator);
        self
    }

    pub fn controller(&self) -> &LifecycleController<D> {
        &self.controller
    }

    /// Consume the suite and return the driver (e.g. to inspect a test double).
    pub fn into_driver(self) -> D {
        self.controller.into_driver()
    }

    /// Run every scenario and tear the suite down.
    pub fn run(&mut self, params: &RuntimeParams, scenarios: &[ScenarioSpec]) -> SuiteReport {
        let mut report = SuiteReport::default();

        match self.controller.before_all(params) {
            Ok(run) => {
                report.run_id = Some(run.run_id().to_string());
                report.environment = Some(run.config().environment.clone());
                report.language = Some(run.config().language.clone());
            }
            Err(e) => {
                error!(
                    error = %e,
                    not_run = scenarios.len(),
                    "suite aborted before any scenario ran"
                );
                report.abort(e.to_string(), scenarios.len());
                self.teardown(&mut report);
                return report;
            }
        }

        for (idx, spec) in scenarios.iter().enumerate() {
            match self.run_scenario(spec) {
                Ok(outcome) => report.scenarios.push(outcome),
                Err(e) => {
                    let not_run = scenarios.len() - idx - 1;
                    error!(
                        scenario = %spec.info.name,
                        error = %e,
                        not_run,
                        "suite aborted, no further scenarios will run"
                    );
                    report.abort(e.to_string(), not_run);
                    break;
                }
            }
        }

        self.teardown(&mut report);
        info!(
            passed = report.passed(),
            failed = report.failed(),
            status = %report.status(),
            "suite report"
        );
        report
    }

    fn teardown(&mut self, report: &mut SuiteReport) {
        match self.controller.after_all() {
            Ok(summary) => report.visual = summary.visual,
            Err(e) => {
                warn!(error = %e, "suite teardown failed");
                report.teardown_error = Some(e.to_string());
            }
        }
    }

    /// Run one scenario. Only fatal errors are returned as `Err`.
    fn run_scenario(&mut self, spec: &ScenarioSpec) -> Result<ScenarioOutcome, StepwiseError> {
        if let Err(e) = self.controller.before_scenario(spec.info.clone()) {
            if e.is_fatal() {
                return Err(e);
            }
            error!(
                scenario = %spec.info.name,
                error = %e,
                "The scenario '{}' could not start",
                spec.info.name
            );
            return Ok(ScenarioOutcome::not_started(
                &spec.info.name,
                e.to_string(),
                &spec.steps,
            ));
        }

        let mut steps = Vec::with_capacity(spec.steps.len());
        let mut failed = false;
        for text in &spec.steps {
            if failed {
                steps.push(StepOutcome {
                    text: text.clone(),
                    status: StepStatus::Skipped,
                });
                continue;
            }
            let status = match self.controller.run_step(&self.steps, text) {
                Ok(()) => StepStatus::Passed,
                Err(e) if e.is_fatal() => {
                    // close the scenario so after_all can run
                    if let Err(cleanup) = self.controller.after_scenario() {
                        warn!(error = %cleanup, "failed to close scenario after fatal error");
                    }
                    return Err(e);
                }
                Err(e) => {
                    failed = true;
                    StepStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            steps.push(StepOutcome {
                text: text.clone(),
                status,
            });
        }

        let report = self.controller.after_scenario()?;
        Ok(ScenarioOutcome::from_report(report, steps))
    }
}

/// Install tracing from the project's `logging.conf`, then run the suite.
///
/// Entry point for a suite binary. The global subscriber can only be set
/// once per process, so call this at most once.
pub fn run_project<D: DriverSessionManager>(
    project: &Project,
    driver: D,
    steps: StepRegistry,
    params: &RuntimeParams,
    scenarios: &[ScenarioSpec],
) -> anyhow::Result<SuiteReport> {
    let logging = init_project_logging(project)?;
    debug!(
        level = %logging.level,
        format = %logging.format,
        file = logging.file,
        "logging initialized"
    );
    let mut suite = Suite::new(project, driver, steps);
    Ok(suite.run(params, scenarios))
}
