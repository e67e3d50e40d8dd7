//! Fault isolation E2E tests.
//!
//! Validates that driver and resource failures stay inside the scenario
//! (or hook) where they happen and never stop the rest of the suite.

use crate::helpers::mock_driver::*;
use crate::helpers::project::TestProject;

use stepwise_core::config::RuntimeParams;
use stepwise_core::steps::StepRegistry;
use stepwise_harness::{ScenarioSpec, StepStatus, Suite, SuiteStatus};

fn open_page_steps(tracker: &Tracker, failing: &'static str) -> StepRegistry {
    let mut steps = StepRegistry::new();
    let tracker = Tracker::clone(tracker);
    steps
        .register("I open the {page} page", move |ctx, args| {
            let name = args.require("page")?;
            let mut page = MockPage::new(name, &tracker);
            if name == failing {
                page = page.failing_release("stale element reference");
            }
            ctx.register_page_object(Box::new(page));
            Ok(())
        })
        .expect("register step");
    steps
}

#[test]
fn test_e2e_session_failure_fails_only_that_scenario() {
    // Given: The driver cannot start a session for "second"
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let driver = MockDriver::new(&tracker).failing_acquire("second");
    let mut suite = Suite::new(&test.project, driver, open_page_steps(&tracker, ""));
    let scenarios = vec![
        ScenarioSpec::new("first").step("I open the a page"),
        ScenarioSpec::new("second").step("I open the b page"),
        ScenarioSpec::new("third").step("I open the c page"),
    ];

    // When
    let report = suite.run(&RuntimeParams::default(), &scenarios);

    // Then: second is failed without running any step, third still runs
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 1);
    let second = &report.scenarios[1];
    assert!(!second.passed());
    assert_eq!(second.steps[0].status, StepStatus::Skipped);
    assert!(report.aborted.is_none());
    assert_eq!(
        events(&tracker),
        vec![
            "init_global:qa:es",
            "acquire:s1:first",
            "release:a",
            "finish:s1:passed",
            "acquire_failed:second",
            "acquire:s2:third",
            "release:c",
            "finish:s2:passed",
            "close_global",
        ]
    );
}

#[test]
fn test_e2e_release_failure_does_not_stop_teardown() {
    // Given: The middle page fails to release
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut suite = Suite::new(
        &test.project,
        MockDriver::new(&tracker),
        open_page_steps(&tracker, "b"),
    );
    let scenarios = vec![
        ScenarioSpec::new("pages")
            .step("I open the a page")
            .step("I open the b page")
            .step("I open the c page"),
    ];

    // When
    let report = suite.run(&RuntimeParams::default(), &scenarios);

    // Then: All three are released in reverse, the scenario still passes
    let pages = &report.scenarios[0];
    assert!(pages.passed());
    assert_eq!(pages.release_failures.len(), 1);
    assert!(
        pages.release_failures[0].contains("'b'")
            && pages.release_failures[0].contains("stale element reference"),
        "failure should name the resource: {:?}",
        pages.release_failures
    );
    assert_eq!(
        &events(&tracker)[2..6],
        &["release:c", "release:b", "release:a", "finish:s1:passed"]
    );
}

#[test]
fn test_e2e_driver_close_failure_is_reported_not_raised() {
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let driver = MockDriver::new(&tracker).failing_close("quit timed out");
    let mut suite = Suite::new(&test.project, driver, StepRegistry::new());

    let report = suite.run(&RuntimeParams::default(), &[ScenarioSpec::new("only")]);

    assert_eq!(report.passed(), 1);
    assert_eq!(report.status(), SuiteStatus::Passed);
    let teardown = report.teardown_error.as_deref().expect("teardown error");
    assert!(teardown.contains("quit timed out"));
}
