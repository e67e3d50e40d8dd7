//! Stepwise harness library.
//!
//! Bridges a scenario runner to the lifecycle controller in `stepwise-core`:
//! project directory conventions, tracing setup from `logging.conf`, the
//! [`Suite`](suite::Suite) runner and its [`SuiteReport`](report::SuiteReport).

pub mod logging;
pub mod project;
pub mod report;
pub mod suite;

pub use project::Project;
pub use report::{ScenarioOutcome, StepOutcome, StepStatus, SuiteReport, SuiteStatus};
pub use suite::{ScenarioSpec, Suite, run_project};
