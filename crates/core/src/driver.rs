//! 드라이버 경계 — 브라우저/API 드라이버 세션 관리 trait
//!
//! 실제 드라이버 구현은 외부 협력자입니다. 생명주기 컨트롤러는
//! [`DriverSessionManager`]의 생성/종료 계약만 호출합니다.
//!
//! # 호출 순서
//! ```text
//! init_global → (acquire_session → capture_screenshot* → finish_scenario)* → close_global
//! ```

use std::fmt;

use crate::config::ResolvedConfig;
use crate::error::DriverError;
use crate::types::{ElementHandle, ScenarioInfo, ScenarioResult};

/// 시나리오 하나가 독점하는 드라이버 세션 핸들
///
/// `Clone`을 구현하지 않으므로 시나리오 간에 공유될 수 없습니다.
/// [`DriverSessionManager::finish_scenario`]에 소유권을 넘기면서 소멸합니다.
#[derive(Debug, PartialEq, Eq)]
pub struct SessionHandle {
    id: String,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// 드라이버 세션 관리자
///
/// 스위트 전역 상태(`init_global`/`close_global`)와
/// 시나리오 세션(`acquire_session`/`finish_scenario`)을 소유합니다.
/// 모든 호출은 동기이며 블로킹입니다.
///
/// # 구현 예시
/// ```ignore
/// struct ApiDriver { next: u32 }
///
/// impl DriverSessionManager for ApiDriver {
///     fn init_global(&mut self, _config: &ResolvedConfig) -> Result<(), DriverError> { Ok(()) }
///     fn acquire_session(&mut self, _scenario: &ScenarioInfo) -> Result<SessionHandle, DriverError> {
///         self.next += 1;
///         Ok(SessionHandle::new(format!("api-{}", self.next)))
///     }
///     // ...
/// }
/// ```
pub trait DriverSessionManager {
    /// 드라이버 이름 (로그용)
    fn name(&self) -> &str {
        "driver"
    }

    /// 스위트 시작 시 전역 드라이버 상태를 초기화합니다.
    fn init_global(&mut self, config: &ResolvedConfig) -> Result<(), DriverError>;

    /// 시나리오용 세션을 획득(또는 재사용 세션을 초기화)합니다.
    fn acquire_session(&mut self, scenario: &ScenarioInfo) -> Result<SessionHandle, DriverError>;

    /// 현재 화면 또는 요소 하나의 스크린샷을 캡처합니다.
    fn capture_screenshot(
        &mut self,
        session: &SessionHandle,
        element: Option<&ElementHandle>,
    ) -> Result<Vec<u8>, DriverError>;

    /// 시나리오 종료를 알립니다 (세션 리셋, 실패 시 스크린샷 등은 구현 정책).
    fn finish_scenario(
        &mut self,
        session: SessionHandle,
        result: &ScenarioResult,
    ) -> Result<(), DriverError>;

    /// 스위트 종료 시 전역 드라이버 상태를 정리합니다.
    fn close_global(&mut self) -> Result<(), DriverError>;
}

/// 브라우저 없이 실행되는 드라이버
///
/// 순번 세션 핸들만 발급하며 스크린샷 캡처는 지원하지 않습니다.
/// API 전용 스위트와 설정 점검에 사용합니다.
#[derive(Debug, Default)]
pub struct NullDriver {
    sessions: u64,
    initialized: bool,
}

impl NullDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 발급한 세션 수
    pub fn sessions_issued(&self) -> u64 {
        self.sessions
    }
}

impl DriverSessionManager for NullDriver {
    fn name(&self) -> &str {
        "null"
    }

    fn init_global(&mut self, _config: &ResolvedConfig) -> Result<(), DriverError> {
        self.initialized = true;
        Ok(())
    }

    fn acquire_session(&mut self, _scenario: &ScenarioInfo) -> Result<SessionHandle, DriverError> {
        if !self.initialized {
            return Err(DriverError::SessionFailed(
                "driver not initialized".to_owned(),
            ));
        }
        self.sessions += 1;
        Ok(SessionHandle::new(format!("null-{}", self.sessions)))
    }

    fn capture_screenshot(
        &mut self,
        _session: &SessionHandle,
        _element: Option<&ElementHandle>,
    ) -> Result<Vec<u8>, DriverError> {
        Err(DriverError::CaptureFailed(
            "null driver cannot capture screenshots".to_owned(),
        ))
    }

    fn finish_scenario(
        &mut self,
        _session: SessionHandle,
        _result: &ScenarioResult,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    fn close_global(&mut self) -> Result<(), DriverError> {
        self.initialized = false;
        Ok(())
    }
}
