//! 에러 타입 — 도메인별 에러 정의
//!
//! 치명적 에러(설정 로드 실패, 훅 순서 위반)와 시나리오 범위 에러
//! (스텝 실패, 시각 불일치, 리소스 해제 실패)를 구분합니다.
//! 어느 쪽인지는 [`StepwiseError::is_fatal`]로 판단합니다.

/// Stepwise 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum StepwiseError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 생명주기 훅 순서 에러
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// 드라이버 세션 에러
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// 리소스 해제 에러
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    /// 시각(스크린샷) 검증 에러
    #[error("visual error: {0}")]
    Visual(#[from] VisualError),

    /// 스텝 디스패치/실행 에러
    #[error("step error: {0}")]
    Step(#[from] StepError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StepwiseError {
    /// 스위트 전체를 중단해야 하는 에러인지 여부
    ///
    /// 설정 로드 실패와 훅 순서 위반만 치명적입니다.
    /// 나머지는 현재 시나리오(또는 테스트) 하나의 실패로 격리됩니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Lifecycle(_))
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 필수 설정 파일이 존재하지만 형식이 잘못됨 (ConfigLoadError)
    #[error("failed to load config {path} (line {line}): {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// 훅이 순서에 맞지 않게 호출됨 (LifecycleOrderError)
    #[error("hook '{hook}' called out of order (state: {state})")]
    OutOfOrder { hook: &'static str, state: String },

    /// 활성 시나리오가 필요한 작업이 시나리오 밖에서 호출됨
    #[error("'{operation}' requires an active scenario")]
    NoActiveScenario { operation: &'static str },
}

/// 드라이버 세션 에러
///
/// 드라이버 구현은 외부 협력자이므로 사유는 문자열로만 전달합니다.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// 전역 드라이버 초기화 실패
    #[error("driver init failed: {0}")]
    InitFailed(String),

    /// 시나리오 세션 획득 실패
    #[error("session acquisition failed: {0}")]
    SessionFailed(String),

    /// 스크린샷 캡처 실패
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// 요소를 찾을 수 없음
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// 기타 드라이버 작업 실패
    #[error("{0}")]
    Other(String),
}

/// 리소스 해제 에러
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// 개별 리소스 해제 실패
    #[error("failed to release '{name}': {reason}")]
    ReleaseFailed { name: String, reason: String },
}

/// 시각 검증 에러
#[derive(Debug, thiserror::Error)]
pub enum VisualError {
    /// 캡처가 기준 이미지와 임계값 이상 다름 (VisualMismatchError)
    #[error("screenshot '{baseline}' differs from baseline: {distance:.4} > threshold {threshold:.4}")]
    Mismatch {
        baseline: String,
        distance: f64,
        threshold: f64,
    },

    /// 임계값이 [0, 1] 범위를 벗어남
    #[error("threshold must be a number between 0 and 1: {0}")]
    InvalidThreshold(f64),

    /// 비교 엔진 실패 (이미지 크기 불일치 등)
    #[error("comparison failed for '{baseline}': {reason}")]
    ComparisonFailed { baseline: String, reason: String },
}

/// 스텝 에러
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// 일치하는 스텝 정의가 없음
    #[error("undefined step: {text}")]
    Undefined { text: String },

    /// 둘 이상의 스텝 정의가 일치함
    #[error("ambiguous step '{text}' matches: {patterns}")]
    Ambiguous { text: String, patterns: String },

    /// 동일한 패턴이 이미 등록됨
    #[error("step pattern already registered: {pattern}")]
    AlreadyRegistered { pattern: String },

    /// 패턴 문법 오류
    #[error("invalid step pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// 스텝 본문의 단언 실패
    #[error("{0}")]
    Failed(String),
}
