//! Logging E2E tests.
//!
//! Validates the human-readable scenario messages emitted during a suite run.

use crate::helpers::logs::{capture, messages_at};
use crate::helpers::mock_driver::*;
use crate::helpers::project::TestProject;

use stepwise_core::config::RuntimeParams;
use stepwise_core::error::StepError;
use stepwise_core::steps::StepRegistry;
use stepwise_harness::{ScenarioSpec, Suite};

#[test]
fn test_e2e_scenario_results_are_logged_once() {
    // Given: One passing and one failing scenario
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut steps = StepRegistry::new();
    steps
        .register("it works", |_, _| Ok(()))
        .expect("register");
    steps
        .register("it breaks", |_, _| {
            Err(StepError::Failed("title mismatch".to_owned()).into())
        })
        .expect("register");
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), steps);
    let scenarios = vec![
        ScenarioSpec::new("good").step("it works"),
        ScenarioSpec::new("bad").step("it breaks"),
    ];

    // When
    let (report, records) = capture(|| suite.run(&RuntimeParams::default(), &scenarios));

    // Then
    assert_eq!(report.failed(), 1);
    let info = messages_at(&records, "INFO");
    assert!(info.contains(&"Running new scenario: good".to_owned()));
    assert!(info.contains(&"Running new scenario: bad".to_owned()));
    assert_eq!(
        info.iter().filter(|m| m.as_str() == "The scenario 'good' has passed").count(),
        1
    );

    let errors = messages_at(&records, "ERROR");
    assert_eq!(
        errors
            .iter()
            .filter(|m| m.starts_with("The scenario 'bad' has failed: "))
            .count(),
        1
    );
    assert!(
        !info.iter().any(|m| m == "The scenario 'bad' has passed"),
        "a failed scenario never logs the pass message"
    );
}

#[test]
fn test_e2e_suite_lifecycle_messages() {
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), StepRegistry::new());

    let (_, records) = capture(|| suite.run(&RuntimeParams::default(), &[]));

    let info = messages_at(&records, "INFO");
    assert!(info.contains(&"suite started".to_owned()));
    assert!(info.contains(&"suite finished".to_owned()));
    assert!(info.contains(&"suite report".to_owned()));
}
