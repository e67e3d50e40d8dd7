//! Suite result reporting.
//!
//! Collects per-scenario and per-step outcomes into a [`SuiteReport`].
//! The overall [`SuiteStatus`] is the worst outcome observed.
//!
//! # Aggregation Rule
//!
//! - Suite aborted by a fatal error -> Aborted
//! - Any scenario failed -> Failed
//! - Otherwise -> Passed

use std::fmt;

use serde::Serialize;

use stepwise_core::lifecycle::ScenarioReport;
use stepwise_core::types::ScenarioResult;
use stepwise_core::visual::VisualCounters;

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed { reason: String },
    /// Not run because an earlier step failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub text: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Outcome of a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: ScenarioResult,
    pub steps: Vec<StepOutcome>,
    /// Resources that failed to release during teardown.
    pub release_failures: Vec<String>,
    pub duration_ms: u64,
}

impl ScenarioOutcome {
    /// Combine the controller's teardown report with the step outcomes.
    pub fn from_report(report: ScenarioReport, steps: Vec<StepOutcome>) -> Self {
        Self {
            name: report.name,
            result: report.result,
            steps,
            release_failures: report.release_failures,
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// A scenario that never entered the running state (e.g. no driver session).
    pub fn not_started(name: &str, reason: String, steps: &[String]) -> Self {
        Self {
            name: name.to_owned(),
            result: ScenarioResult::Failed { reason },
            steps: steps
                .iter()
                .map(|text| StepOutcome {
                    text: text.clone(),
                    status: StepStatus::Skipped,
                })
                .collect(),
            release_failures: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        !self.result.is_failed()
    }
}

/// Overall suite status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteStatus {
    Passed,
    Failed,
    Aborted,
}

impl fmt::Display for SuiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Aggregated report for one suite run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    pub run_id: Option<String>,
    pub environment: Option<String>,
    pub language: Option<String>,
    pub scenarios: Vec<ScenarioOutcome>,
    /// Fatal error that stopped the suite, if any.
    pub aborted: Option<String>,
    /// Scenarios that did not run because the suite aborted.
    pub not_run: usize,
    /// Error raised while tearing the suite down.
    pub teardown_error: Option<String>,
    pub visual: VisualCounters,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    /// Total skipped steps across all scenarios.
    pub fn skipped_steps(&self) -> usize {
        self.scenarios
            .iter()
            .flat_map(|s| &s.steps)
            .filter(|s| s.status == StepStatus::Skipped)
            .count()
    }

    pub fn status(&self) -> SuiteStatus {
        if self.aborted.is_some() {
            SuiteStatus::Aborted
        } else if self.failed() > 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::Passed
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == SuiteStatus::Passed
    }

    pub(crate) fn abort(&mut self, reason: String, not_run: usize) {
        self.aborted = Some(reason);
        self.not_run = not_run;
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} passed, {} failed, {} steps skipped",
            self.status(),
            self.passed(),
            self.failed(),
            self.skipped_steps()
        )?;
        if let Some(reason) = &self.aborted {
            write!(f, "; aborted ({}), {} scenario(s) did not run", reason, self.not_run)?;
        }
        Ok(())
    }
}
