//! 도메인 타입 — 시나리오 메타데이터, 시나리오 결과, 요소 핸들
//!
//! 생명주기 컨트롤러와 드라이버 경계, 하네스가 공유하는 데이터 구조입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 시나리오 메타데이터
///
/// 시나리오 러너가 `before_scenario`에 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioInfo {
    /// 시나리오 이름
    pub name: String,
    /// 태그 (`@smoke` 등, `@` 제외)
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ScenarioInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl fmt::Display for ScenarioInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 시나리오 결과 (3값)
///
/// 시나리오 시작 시 `Pending`이며, 첫 실패가 기록되면 `Failed`로 고정됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScenarioResult {
    /// 아직 결과 없음
    #[default]
    Pending,
    /// 통과
    Passed,
    /// 실패 (사유 포함)
    Failed { reason: String },
}

impl ScenarioResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// 종료 시점의 결과. `Pending`은 통과로 확정됩니다.
    pub fn finalize(self) -> Self {
        match self {
            Self::Pending => Self::Passed,
            other => other,
        }
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Passed => write!(f, "passed"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// 드라이버가 이해하는 요소 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// 로케이터 (예: `id=login`, `css=.title`)
    pub locator: String,
}

impl ElementHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.locator)
    }
}
