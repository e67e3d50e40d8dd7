//! Suite lifecycle E2E tests.
//!
//! Validates hook ordering across a full suite run, per-scenario resource
//! teardown, and configuration layering as seen by step handlers.

use crate::helpers::mock_driver::*;
use crate::helpers::project::TestProject;

use stepwise_core::config::RuntimeParams;
use stepwise_core::error::StepError;
use stepwise_core::steps::StepRegistry;
use stepwise_harness::{ScenarioSpec, StepStatus, Suite, SuiteStatus};

/// Registry with a step that opens a named page and registers it for teardown.
fn steps_with_pages(tracker: &Tracker) -> StepRegistry {
    let mut steps = StepRegistry::with_builtin_steps();
    let tracker = Tracker::clone(tracker);
    steps
        .register("I open the {page} page", move |ctx, args| {
            let page = args.require("page")?;
            ctx.register_page_object(Box::new(MockPage::new(page, &tracker)));
            Ok(())
        })
        .expect("register step");
    steps
}

#[test]
fn test_e2e_suite_runs_hooks_in_order() {
    // Given: A scaffolded project and two scenarios opening pages
    let test = TestProject::scaffolded();
    let tracker = Tracker::default();
    let mut suite = Suite::new(
        &test.project,
        MockDriver::new(&tracker),
        steps_with_pages(&tracker),
    );
    let scenarios = vec![
        ScenarioSpec::new("login")
            .step("I open the login page")
            .step("I open the home page"),
        ScenarioSpec::new("logout").step("I open the settings page"),
    ];

    // When: Running the suite with default parameters
    let report = suite.run(&RuntimeParams::default(), &scenarios);

    // Then: Driver and resource events follow the lifecycle order
    assert_eq!(
        events(&tracker),
        vec![
            "init_global:qa:es",
            "acquire:s1:login",
            "release:home",
            "release:login",
            "finish:s1:passed",
            "acquire:s2:logout",
            "release:settings",
            "finish:s2:passed",
            "close_global",
        ]
    );
    assert_eq!(report.status(), SuiteStatus::Passed);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.environment.as_deref(), Some("qa"));
    assert_eq!(report.language.as_deref(), Some("es"));
    assert!(report.run_id.is_some());
}

#[test]
fn test_e2e_failed_step_skips_rest_of_scenario_only() {
    // Given: A scenario whose second step is undefined
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut suite = Suite::new(
        &test.project,
        MockDriver::new(&tracker),
        steps_with_pages(&tracker),
    );
    let scenarios = vec![
        ScenarioSpec::new("broken")
            .step("I open the login page")
            .step("I click the missing button")
            .step("I open the home page"),
        ScenarioSpec::new("healthy").step("I open the home page"),
    ];

    // When
    let report = suite.run(&RuntimeParams::default(), &scenarios);

    // Then: First scenario fails, its last step is skipped, the second passes
    let broken = &report.scenarios[0];
    assert!(!broken.passed());
    assert_eq!(broken.steps[0].status, StepStatus::Passed);
    let undefined = StepError::Undefined {
        text: "I click the missing button".to_owned(),
    };
    assert_eq!(
        broken.steps[1].status,
        StepStatus::Failed {
            reason: format!("step error: {undefined}")
        }
    );
    assert_eq!(broken.steps[2].status, StepStatus::Skipped);
    assert!(report.scenarios[1].passed());

    assert_eq!(report.status(), SuiteStatus::Failed);
    assert_eq!(report.skipped_steps(), 1);

    // The page opened before the failure is still released
    let events = events(&tracker);
    assert!(events.contains(&"release:login".to_owned()));
    assert!(events.contains(&"finish:s1:failed".to_owned()));
}

#[test]
fn test_e2e_steps_see_layered_configuration() {
    // Given: Framework + PRE environment + English language files
    let test = TestProject::empty()
        .with_setting(
            "toolium.conf",
            "[Server]\nurl = http://localhost\ntimeout = 10\n",
        )
        .with_setting(
            "pre-properties.json",
            r#"{"Server": {"url": "https://pre.example.com"}}"#,
        )
        .with_setting("language/en_login.cfg", "title = Sign in\n");
    let tracker = Tracker::default();
    let mut steps = StepRegistry::new();
    steps
        .register("the server is {url}", |ctx, args| {
            let expected = args.require("url")?;
            match ctx.property("Server.url") {
                Some(actual) if actual == expected => Ok(()),
                other => Err(StepError::Failed(format!("server is {other:?}")).into()),
            }
        })
        .expect("register");
    steps
        .register("the timeout is {seconds}", |ctx, args| {
            let expected = args.require("seconds")?;
            match ctx.property("Server.timeout") {
                Some(actual) if actual == expected => Ok(()),
                other => Err(StepError::Failed(format!("timeout is {other:?}")).into()),
            }
        })
        .expect("register");
    steps
        .register("the login title reads {title}", |ctx, args| {
            let expected = args.require("title")?;
            match ctx.language_text("login", "title") {
                Some(actual) if actual == expected => Ok(()),
                other => Err(StepError::Failed(format!("title is {other:?}")).into()),
            }
        })
        .expect("register");
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), steps);
    let scenarios = vec![
        ScenarioSpec::new("config")
            .step("the server is https://pre.example.com")
            .step("the timeout is 10")
            .step("the login title reads Sign in"),
    ];

    // When: Running with mixed-case parameters
    let report = suite.run(&RuntimeParams::new("PRE", "EN"), &scenarios);

    // Then
    assert!(report.is_success(), "report: {report}");
    assert_eq!(events(&tracker)[0], "init_global:pre:en");
}

#[test]
fn test_e2e_empty_suite_still_initializes_and_closes() {
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), StepRegistry::new());

    let report = suite.run(&RuntimeParams::default(), &[]);

    assert!(report.is_success());
    assert_eq!(events(&tracker), vec!["init_global:qa:es", "close_global"]);
    assert!(test.output_dir().is_dir());
}

#[test]
fn test_e2e_scenario_spec_deserializes_from_json() {
    let spec: ScenarioSpec = serde_json::from_str(
        r#"{"name": "checkout", "tags": ["smoke"], "steps": ["I open the cart page"]}"#,
    )
    .expect("deserialize");

    assert_eq!(spec, ScenarioSpec::new("checkout").tagged(["smoke"]).step("I open the cart page"));
    assert!(spec.info.has_tag("smoke"));
}
