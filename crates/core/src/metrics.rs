//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않은 프로세스에서는 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `stepwise_`
//! - 영역명: `scenario_`, `resource_`, `visual_`, `test_case_`, `config_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(stepwise_core::metrics::SCENARIOS_TOTAL, "result" => "passed").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (passed, failed)
pub const LABEL_RESULT: &str = "result";

/// 시각 검증 결과 레이블 키 (skipped, baseline, equal, diff)
pub const LABEL_OUTCOME: &str = "outcome";

/// 설정 소스 역할 레이블 키 (framework, environment, language)
pub const LABEL_ROLE: &str = "role";

// ─── 설정 ────────────────────────────────────────────────────────────

/// 설정 해석 소요 시간 (histogram, 초)
pub const CONFIG_RESOLVE_DURATION_SECONDS: &str = "stepwise_config_resolve_duration_seconds";

// ─── 시나리오 ─────────────────────────────────────────────────────────

/// 완료된 시나리오 수 (counter, label: result)
pub const SCENARIOS_TOTAL: &str = "stepwise_scenarios_total";

/// 시나리오 소요 시간 (histogram, 초)
pub const SCENARIO_DURATION_SECONDS: &str = "stepwise_scenario_duration_seconds";

// ─── 리소스 ──────────────────────────────────────────────────────────

/// 해제된 리소스 수 (counter)
pub const RESOURCES_RELEASED_TOTAL: &str = "stepwise_resources_released_total";

/// 리소스 해제 실패 수 (counter)
pub const RESOURCE_RELEASE_FAILURES_TOTAL: &str = "stepwise_resource_release_failures_total";

// ─── 시각 검증 ───────────────────────────────────────────────────────

/// 스크린샷 단언 수 (counter, label: outcome)
pub const VISUAL_ASSERTIONS_TOTAL: &str = "stepwise_visual_assertions_total";

// ─── 테스트 케이스 ───────────────────────────────────────────────────

/// 실행된 테스트 케이스 수 (counter, label: result)
pub const TEST_CASES_TOTAL: &str = "stepwise_test_cases_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_histogram!(
        CONFIG_RESOLVE_DURATION_SECONDS,
        "Time spent resolving the layered configuration"
    );
    describe_counter!(SCENARIOS_TOTAL, "Scenarios completed, by result");
    describe_histogram!(
        SCENARIO_DURATION_SECONDS,
        "Scenario duration from before_scenario to after_scenario"
    );
    describe_counter!(
        RESOURCES_RELEASED_TOTAL,
        "Page-object resources released during scenario teardown"
    );
    describe_counter!(
        RESOURCE_RELEASE_FAILURES_TOTAL,
        "Resource releases that failed during scenario teardown"
    );
    describe_counter!(VISUAL_ASSERTIONS_TOTAL, "Screenshot assertions, by outcome");
    describe_counter!(TEST_CASES_TOTAL, "Unit-style test cases run, by result");
}
