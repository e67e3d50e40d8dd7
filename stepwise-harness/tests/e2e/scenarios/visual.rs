//! Visual testing E2E tests.
//!
//! Runs the built-in screenshot steps through a full suite and checks
//! the baseline and capture files written to the output directory.

use crate::helpers::mock_driver::*;
use crate::helpers::project::TestProject;

use stepwise_core::config::RuntimeParams;
use stepwise_core::steps::StepRegistry;
use stepwise_harness::{ScenarioSpec, StepStatus, Suite};

fn visual_steps(tracker: &Tracker) -> StepRegistry {
    let mut steps = StepRegistry::with_builtin_steps();
    let tracker = Tracker::clone(tracker);
    steps
        .register("I am on the login page", move |ctx, _| {
            let page = MockPage::new("login", &tracker)
                .with_element("username", "id=username", true)
                .with_element("banner", "id=banner", false);
            ctx.register_page_object(Box::new(page));
            Ok(())
        })
        .expect("register step");
    steps
}

#[test]
fn test_e2e_first_run_saves_baseline_second_run_matches() {
    // Given: Visual tests enabled
    let test = TestProject::empty().with_visual_tests(true);
    let tracker = Tracker::default();
    let scenario = ScenarioSpec::new("visual")
        .step("I am on the login page")
        .step("the \"username\" element matches the \"username_field\" screenshot")
        .step("the screen matches the \"login_screen\" screenshot");

    // When: Running the same suite twice
    let mut first = Suite::new(&test.project, MockDriver::new(&tracker), visual_steps(&tracker));
    let first_report = first.run(&RuntimeParams::default(), std::slice::from_ref(&scenario));
    let mut second = Suite::new(&test.project, MockDriver::new(&tracker), visual_steps(&tracker));
    let second_report = second.run(&RuntimeParams::default(), std::slice::from_ref(&scenario));

    // Then: Baselines are created once, then compared
    assert!(first_report.is_success(), "{first_report}");
    assert_eq!(first_report.visual.baseline, 2);
    assert!(second_report.is_success(), "{second_report}");
    assert_eq!(second_report.visual.equal, 2);
    assert_eq!(second_report.visual.diff, 0);

    let baseline_dir = test.output_dir().join("visualtests/baseline/default");
    assert!(baseline_dir.join("username_field.png").is_file());
    assert!(baseline_dir.join("login_screen.png").is_file());
    assert!(test.output_dir().join("visualtests/01_username_field__chrome.png").is_file());

    // Only the summary is kept when complete_report is off
    let html = std::fs::read_to_string(test.output_dir().join("visualtests/VisualTests.html"))
        .expect("visual report");
    assert!(html.contains("<b>Visual asserts</b>: 2 (0 failed)"));
    assert!(!html.contains("<tr class="));
}

#[test]
fn test_e2e_visual_mismatch_is_added_to_report() {
    // Given: A baseline from a previous run
    let test = TestProject::empty().with_visual_tests(true);
    let tracker = Tracker::default();
    let scenario = ScenarioSpec::new("visual").step("the screen matches the \"home\" screenshot");
    let mut first = Suite::new(&test.project, MockDriver::new(&tracker), visual_steps(&tracker));
    first.run(&RuntimeParams::default(), std::slice::from_ref(&scenario));

    // When: The screen changed
    let mut driver = MockDriver::new(&tracker);
    driver.screenshot = b"changed".to_vec();
    let mut second = Suite::new(&test.project, driver, visual_steps(&tracker));
    let report = second.run(&RuntimeParams::default(), std::slice::from_ref(&scenario));

    // Then: The scenario fails and the report has a diff row
    assert_eq!(report.failed(), 1);
    assert_eq!(report.visual.diff, 1);
    let html = std::fs::read_to_string(test.output_dir().join("visualtests/VisualTests.html"))
        .expect("visual report");
    assert!(html.contains("<tr class=\"diff\"><td>chrome (home)</td>"));
    assert!(html.contains("<b>Visual asserts</b>: 1 (1 failed)"));
}

#[test]
fn test_e2e_hidden_element_fails_displayed_step() {
    let test = TestProject::empty();
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), visual_steps(&tracker));
    let scenarios = vec![
        ScenarioSpec::new("banner")
            .step("I am on the login page")
            .step("the \"banner\" element is displayed"),
    ];

    let report = suite.run(&RuntimeParams::default(), &scenarios);

    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.scenarios[0].steps[1].status,
        StepStatus::Failed { .. }
    ));
    // the page is released even though the step failed
    assert!(events(&tracker).contains(&"release:login".to_owned()));
}

#[test]
fn test_e2e_screenshot_steps_skip_when_visual_disabled() {
    let test = TestProject::scaffolded();
    let tracker = Tracker::default();
    let mut suite = Suite::new(&test.project, MockDriver::new(&tracker), visual_steps(&tracker));
    let scenarios = vec![
        ScenarioSpec::new("no visual").step("the screen matches the \"home\" screenshot"),
    ];

    let report = suite.run(&RuntimeParams::default(), &scenarios);

    assert!(report.is_success());
    assert_eq!(report.visual, Default::default());
    assert!(
        !events(&tracker).iter().any(|e| e.starts_with("capture:")),
        "nothing is captured when visual tests are disabled"
    );
}
