//! Configuration error E2E tests.
//!
//! A broken framework file or invalid runtime parameters are fatal:
//! the suite aborts before any scenario starts and the driver is untouched.
//! A fatal error raised by a step closes its scenario as failed, then aborts.

use crate::helpers::logs::{capture, messages_at};
use crate::helpers::mock_driver::*;
use crate::helpers::project::TestProject;

use stepwise_core::config::{RuntimeParams, SourceRole, SourceStatus};
use stepwise_core::error::ConfigError;
use stepwise_core::steps::StepRegistry;
use stepwise_harness::{ScenarioSpec, Suite, SuiteStatus};

fn scenarios() -> Vec<ScenarioSpec> {
    vec![ScenarioSpec::new("a"), ScenarioSpec::new("b")]
}

#[test]
fn test_e2e_malformed_framework_config_aborts_suite() {
    // Given: An unclosed section header in toolium.conf
    let test = TestProject::empty().with_setting("toolium.conf", "[Driver\ntype = chrome\n");
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), StepRegistry::new());

    // When
    let report = suite.run(&RuntimeParams::default(), &scenarios());

    // Then: Nothing ran, the driver was never initialized
    assert_eq!(report.status(), SuiteStatus::Aborted);
    assert_eq!(report.not_run, 2);
    assert!(report.scenarios.is_empty());
    assert!(report.run_id.is_none());
    let reason = report.aborted.as_deref().expect("abort reason");
    assert!(reason.starts_with("config error:"), "reason: {reason}");
    assert!(events(&tracker).is_empty());
}

#[test]
fn test_e2e_path_like_environment_is_rejected() {
    let test = TestProject::scaffolded();
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), StepRegistry::new());

    let report = suite.run(&RuntimeParams::new("../secrets", "es"), &scenarios());

    assert_eq!(report.status(), SuiteStatus::Aborted);
    assert!(events(&tracker).is_empty());
}

#[test]
fn test_e2e_driver_init_failure_aborts_suite() {
    let test = TestProject::scaffolded();
    let tracker = Tracker::default();
    let driver = MockDriver::new(&tracker).failing_init("geckodriver not found");
    let mut suite = Suite::new(&test.project, driver, StepRegistry::new());

    let report = suite.run(&RuntimeParams::default(), &scenarios());

    assert_eq!(report.status(), SuiteStatus::Aborted);
    assert!(
        report
            .aborted
            .as_deref()
            .is_some_and(|r| r.contains("geckodriver not found"))
    );
    assert_eq!(events(&tracker), vec!["init_global:qa:es"]);
}

#[test]
fn test_e2e_malformed_environment_file_is_skipped() {
    // Given: A broken environment file on top of a valid framework file
    let test = TestProject::empty()
        .with_setting("toolium.conf", "[Driver]\ntype = firefox\n")
        .with_setting("qa-properties.json", "{ not json");
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), StepRegistry::new());

    // When
    let report = suite.run(&RuntimeParams::default(), &scenarios());

    // Then: The suite runs on the framework layer alone
    assert!(report.is_success());
    let resolved = test
        .project
        .resolver()
        .resolve(&RuntimeParams::default())
        .expect("resolve");
    assert_eq!(resolved.properties.get("Driver.type"), Some("firefox"));
    let environment = resolved
        .sources
        .iter()
        .find(|s| s.role == SourceRole::Environment)
        .expect("environment source");
    assert!(matches!(environment.status, SourceStatus::Skipped { .. }));
}

#[test]
fn test_e2e_fatal_step_error_fails_scenario_and_aborts() {
    // Given: A step that hits an invalid configuration value
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut steps = StepRegistry::new();
    steps
        .register("the driver type is checked", |_, _| {
            Err(ConfigError::InvalidValue {
                field: "Driver.type".to_owned(),
                reason: "unsupported driver".to_owned(),
            }
            .into())
        })
        .expect("register");
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), steps);
    let scenarios = vec![
        ScenarioSpec::new("doomed").step("the driver type is checked"),
        ScenarioSpec::new("after"),
    ];

    // When
    let (report, records) = capture(|| suite.run(&RuntimeParams::default(), &scenarios));

    // Then: The suite aborts, but the open scenario is closed as failed
    assert_eq!(report.status(), SuiteStatus::Aborted);
    assert_eq!(report.not_run, 1);
    assert_eq!(
        events(&tracker),
        vec![
            "init_global:qa:es",
            "acquire:s1:doomed",
            "finish:s1:failed",
            "close_global",
        ]
    );
    assert_eq!(suite.controller().summary().passed, 0);
    assert_eq!(suite.controller().summary().failed, 1);
    assert!(
        !messages_at(&records, "INFO")
            .iter()
            .any(|m| m == "The scenario 'doomed' has passed")
    );
    assert!(
        messages_at(&records, "ERROR")
            .iter()
            .any(|m| m.starts_with("The scenario 'doomed' has failed: "))
    );
}
