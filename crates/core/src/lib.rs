#![doc = include_str!("../README.md")]

pub mod config;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod properties;
pub mod registry;
pub mod steps;
pub mod test_case;
pub mod types;
pub mod visual;
pub mod visual_report;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{
    ConfigError, DriverError, LifecycleError, ResourceError, StepError, StepwiseError,
    VisualError,
};

// 설정
pub use config::{
    ConfigLayout, ConfigResolver, LoggingConfig, ResolvedConfig, RuntimeParams, SourceReport,
    SourceRole, SourceStatus,
};
pub use properties::PropertyStore;

// 생명주기
pub use driver::{DriverSessionManager, NullDriver, SessionHandle};
pub use lifecycle::{
    LifecycleController, RunContext, RunSummary, ScenarioContext, ScenarioReport, ScenarioState,
    SuiteState,
};
pub use registry::{PageElement, PageObject, ReleaseReport, ResourceRegistry};
pub use steps::{StepArgs, StepContext, StepRegistry};

// 시각 검증
pub use visual::{ScreenshotComparator, VisualCounters, VisualOutcome, VisualSettings};
pub use visual_report::VisualReport;

// 단위 테스트 진입점
pub use test_case::{TestCase, TestCaseResult, TestFailure, run_test};

// 도메인 타입
pub use types::{ElementHandle, ScenarioInfo, ScenarioResult};
