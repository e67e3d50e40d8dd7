//! Mock driver and page objects for E2E suite tests.
//!
//! Every call is appended to a shared [`Tracker`] so tests can assert
//! the exact order of driver and resource events across a suite run.

use std::cell::RefCell;
use std::rc::Rc;

use stepwise_core::ResolvedConfig;
use stepwise_core::driver::{DriverSessionManager, SessionHandle};
use stepwise_core::error::DriverError;
use stepwise_core::registry::{PageElement, PageObject};
use stepwise_core::types::{ElementHandle, ScenarioInfo, ScenarioResult};

/// Shared, ordered event log.
pub type Tracker = Rc<RefCell<Vec<String>>>;

#[allow(dead_code)]
pub fn events(tracker: &Tracker) -> Vec<String> {
    tracker.borrow().clone()
}

/// A driver that records calls and supports failure injection.
pub struct MockDriver {
    tracker: Tracker,
    /// Scenario names whose session acquisition fails.
    pub fail_acquire_for: Vec<String>,
    /// If set, `init_global()` fails with this message.
    pub init_error: Option<String>,
    /// If set, `close_global()` fails with this message.
    pub close_error: Option<String>,
    /// Bytes returned by every capture.
    pub screenshot: Vec<u8>,
    next_session: u32,
}

impl MockDriver {
    pub fn new(tracker: &Tracker) -> Self {
        Self {
            tracker: Rc::clone(tracker),
            fail_acquire_for: Vec::new(),
            init_error: None,
            close_error: None,
            screenshot: b"frame".to_vec(),
            next_session: 0,
        }
    }

    #[allow(dead_code)]
    pub fn failing_acquire(mut self, scenario: &str) -> Self {
        self.fail_acquire_for.push(scenario.to_owned());
        self
    }

    #[allow(dead_code)]
    pub fn failing_init(mut self, reason: &str) -> Self {
        self.init_error = Some(reason.to_owned());
        self
    }

    #[allow(dead_code)]
    pub fn failing_close(mut self, reason: &str) -> Self {
        self.close_error = Some(reason.to_owned());
        self
    }

    fn record(&self, event: String) {
        self.tracker.borrow_mut().push(event);
    }
}

impl DriverSessionManager for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn init_global(&mut self, config: &ResolvedConfig) -> Result<(), DriverError> {
        self.record(format!("init_global:{}:{}", config.environment, config.language));
        match &self.init_error {
            Some(reason) => Err(DriverError::InitFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn acquire_session(&mut self, scenario: &ScenarioInfo) -> Result<SessionHandle, DriverError> {
        if self.fail_acquire_for.contains(&scenario.name) {
            self.record(format!("acquire_failed:{}", scenario.name));
            return Err(DriverError::SessionFailed("browser did not start".to_owned()));
        }
        self.next_session += 1;
        let id = format!("s{}", self.next_session);
        self.record(format!("acquire:{id}:{}", scenario.name));
        Ok(SessionHandle::new(id))
    }

    fn capture_screenshot(
        &mut self,
        session: &SessionHandle,
        element: Option<&ElementHandle>,
    ) -> Result<Vec<u8>, DriverError> {
        let target = element.map_or("screen", |e| e.locator.as_str());
        self.record(format!("capture:{session}:{target}"));
        Ok(self.screenshot.clone())
    }

    fn finish_scenario(
        &mut self,
        session: SessionHandle,
        result: &ScenarioResult,
    ) -> Result<(), DriverError> {
        let status = if result.is_failed() { "failed" } else { "passed" };
        self.record(format!("finish:{session}:{status}"));
        Ok(())
    }

    fn close_global(&mut self) -> Result<(), DriverError> {
        self.record("close_global".to_owned());
        match &self.close_error {
            Some(reason) => Err(DriverError::Other(reason.clone())),
            None => Ok(()),
        }
    }
}

/// A page element with a fixed visibility.
pub struct MockElement {
    pub locator: String,
    pub displayed: bool,
}

impl PageElement for MockElement {
    fn handle(&self) -> ElementHandle {
        ElementHandle::new(self.locator.clone())
    }

    fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(self.displayed)
    }
}

/// A page object exposing named elements and recording its release.
pub struct MockPage {
    name: String,
    elements: Vec<(String, MockElement)>,
    release_error: Option<String>,
    tracker: Tracker,
}

impl MockPage {
    pub fn new(name: &str, tracker: &Tracker) -> Self {
        Self {
            name: name.to_owned(),
            elements: Vec::new(),
            release_error: None,
            tracker: Rc::clone(tracker),
        }
    }

    #[allow(dead_code)]
    pub fn with_element(mut self, name: &str, locator: &str, displayed: bool) -> Self {
        self.elements.push((
            name.to_owned(),
            MockElement {
                locator: locator.to_owned(),
                displayed,
            },
        ));
        self
    }

    #[allow(dead_code)]
    pub fn failing_release(mut self, reason: &str) -> Self {
        self.release_error = Some(reason.to_owned());
        self
    }
}

impl PageObject for MockPage {
    fn name(&self) -> &str {
        &self.name
    }

    fn element(&self, name: &str) -> Option<&dyn PageElement> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e as &dyn PageElement)
    }

    fn release(&mut self) -> Result<(), DriverError> {
        self.tracker
            .borrow_mut()
            .push(format!("release:{}", self.name));
        match &self.release_error {
            Some(reason) => Err(DriverError::Other(reason.clone())),
            None => Ok(()),
        }
    }
}
