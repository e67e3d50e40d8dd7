//! 단위 테스트 스타일 진입점 — setUp/본문/tearDown 실행과 결과 기록
//!
//! [`run_test`]는 테스트 하나를 실행하고 변경 불가능한 [`TestCaseResult`]를 반환합니다.
//!
//! # 로그 계약
//! - 시작 메시지 `Running new test: <id>` (info) 는 결과와 무관하게 정확히 한 번
//! - 통과: `The test '<id>' has passed` (info)
//! - 실패: `The test '<id>' has failed: <message>` (error)
//!
//! 종료 메시지는 둘 중 정확히 하나만 출력됩니다.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::StepwiseError;
use crate::metrics as m;

/// 테스트 실패 (단언 실패 메시지)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TestFailure {
    pub message: String,
}

impl TestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<StepwiseError> for TestFailure {
    fn from(err: StepwiseError) -> Self {
        Self::new(err.to_string())
    }
}

/// 조건이 거짓이면 [`TestFailure`]를 반환하는 단언 헬퍼
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), TestFailure> {
    if condition {
        Ok(())
    } else {
        Err(TestFailure::new(message))
    }
}

/// setUp/tearDown 훅을 가진 테스트 케이스
pub trait TestCase {
    /// 테스트 식별자 (로그와 결과에 사용)
    fn id(&self) -> &str;

    fn set_up(&mut self) -> Result<(), TestFailure> {
        Ok(())
    }

    fn tear_down(&mut self) -> Result<(), TestFailure> {
        Ok(())
    }
}

/// 테스트 실행 결과. 완료 후에는 변경할 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseResult {
    id: String,
    passed: bool,
    failure: Option<String>,
}

impl TestCaseResult {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    /// 실패 사유 (통과 시 `None`)
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

/// 실행 중인 테스트의 결과 기록
struct PendingResult {
    id: String,
    failure: Option<String>,
}

impl PendingResult {
    fn fail(&mut self, message: String) {
        if self.failure.is_none() {
            self.failure = Some(message);
        } else {
            warn!(test = %self.id, error = %message, "additional failure after test already failed");
        }
    }

    fn finalize(self) -> TestCaseResult {
        TestCaseResult {
            passed: self.failure.is_none(),
            id: self.id,
            failure: self.failure,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "test panicked".to_owned()
    }
}

/// 테스트 하나를 실행합니다.
///
/// 본문이 `Err`를 반환하거나 패닉(예: `assert!` 실패)하면 실패로 기록됩니다.
/// `set_up`이 실패하면 본문과 `tear_down`은 실행되지 않습니다.
/// 그 외에는 `tear_down`이 항상 실행되며, 통과한 테스트의 `tear_down` 실패는 테스트 실패가 됩니다.
pub fn run_test<T, F>(case: &mut T, body: F) -> TestCaseResult
where
    T: TestCase + ?Sized,
    F: FnOnce(&mut T) -> Result<(), TestFailure>,
{
    let mut pending = PendingResult {
        id: case.id().to_owned(),
        failure: None,
    };
    info!("Running new test: {}", pending.id);

    match case.set_up() {
        Err(e) => pending.fail(format!("set_up failed: {e}")),
        Ok(()) => {
            match catch_unwind(AssertUnwindSafe(|| body(&mut *case))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => pending.fail(e.message),
                Err(payload) => pending.fail(panic_message(&*payload)),
            }
            if let Err(e) = case.tear_down() {
                pending.fail(format!("tear_down failed: {e}"));
            }
        }
    }

    let result = pending.finalize();
    match result.failure() {
        None => info!("The test '{}' has passed", result.id()),
        Some(message) => error!("The test '{}' has failed: {}", result.id(), message),
    }

    let label = if result.passed() { "passed" } else { "failed" };
    metrics::counter!(m::TEST_CASES_TOTAL, m::LABEL_RESULT => label).increment(1);
    result
}
