//! 테스트 생명주기 컨트롤러 — 스위트/시나리오 훅 상태 머신
//!
//! [`LifecycleController`]는 훅을 엄격한 순서로만 허용하고,
//! 스위트 시작 시 설정을 한 번 해석하며, 시나리오 경계마다
//! 드라이버 세션과 리소스 레지스트리를 생성/정리합니다.
//!
//! # 상태 전환
//! ```text
//! 스위트:   Uninitialized → before_all → SuiteReady → after_all → SuiteClosed
//! 시나리오: Idle → before_scenario → Running → after_scenario → Idle   (SuiteReady 안에서만)
//! ```
//!
//! # 에러 정책
//! - 설정 로드 실패, 훅 순서 위반: 치명적 (호출자에게 즉시 전파)
//! - 리소스 해제 실패: 로그만 남기고 나머지 리소스 해제를 계속
//! - 스텝/시각 검증 실패: 현재 시나리오의 실패로 기록

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{Span, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::{ConfigResolver, LoggingConfig, ResolvedConfig, RuntimeParams};
use crate::driver::{DriverSessionManager, SessionHandle};
use crate::error::{LifecycleError, StepwiseError};
use crate::metrics as m;
use crate::registry::{PageObject, ResourceRegistry};
use crate::steps::{StepContext, StepRegistry};
use crate::types::{ElementHandle, ScenarioInfo, ScenarioResult};
use crate::visual::{
    ScreenshotComparator, VisualCounters, VisualOutcome, VisualRecorder, VisualSettings,
};

// ─── 상태 ────────────────────────────────────────────────────────────

/// 스위트 범위 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteState {
    /// before_all 전
    Uninitialized,
    /// 시나리오 실행 가능
    SuiteReady,
    /// after_all 완료
    SuiteClosed,
}

impl fmt::Display for SuiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::SuiteReady => write!(f, "suite-ready"),
            Self::SuiteClosed => write!(f, "suite-closed"),
        }
    }
}

/// 시나리오 범위 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioState {
    Idle,
    Running,
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
        }
    }
}

// ─── RunContext ──────────────────────────────────────────────────────

/// 스위트 실행 컨텍스트
///
/// `before_all`에서 생성되어 `after_all`에서 소멸합니다.
/// 해석된 설정은 [`Arc`]로 공유되며 읽기 전용입니다.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    config: Arc<ResolvedConfig>,
    logging: LoggingConfig,
    visual: VisualRecorder,
    span: Span,
    started: Instant,
}

impl RunContext {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub fn visual_settings(&self) -> &VisualSettings {
        self.visual.settings()
    }

    pub fn visual_counters(&self) -> VisualCounters {
        self.visual.counters()
    }

    /// 스위트 로그 스팬 (시나리오 스팬의 부모)
    pub fn span(&self) -> &Span {
        &self.span
    }
}

// ─── ScenarioContext ─────────────────────────────────────────────────

/// 시나리오 하나의 컨텍스트
///
/// 시나리오 동안 컨트롤러가 독점 소유합니다.
#[derive(Debug)]
pub struct ScenarioContext {
    info: ScenarioInfo,
    pub(crate) resources: ResourceRegistry,
    pub(crate) session: SessionHandle,
    result: ScenarioResult,
    span: Span,
    started: Instant,
}

impl ScenarioContext {
    fn new(info: ScenarioInfo, session: SessionHandle, span: Span) -> Self {
        Self {
            info,
            resources: ResourceRegistry::new(),
            session,
            result: ScenarioResult::Pending,
            span,
            started: Instant::now(),
        }
    }

    pub fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn result(&self) -> &ScenarioResult {
        &self.result
    }

    /// 첫 실패만 기록합니다.
    fn fail(&mut self, reason: String) {
        if !self.result.is_failed() {
            self.result = ScenarioResult::Failed { reason };
        }
    }
}

// ─── 보고 ────────────────────────────────────────────────────────────

/// 종료된 시나리오 보고
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub result: ScenarioResult,
    /// 해제 순서대로의 리소스 이름
    pub released: Vec<String>,
    pub release_failures: Vec<String>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// 스위트 누적 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub visual: VisualCounters,
}

mod duration_ms {
    use std::time::Duration;

    pub fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

// ─── LifecycleController ─────────────────────────────────────────────

/// 테스트 생명주기 컨트롤러
///
/// 드라이버 세션 관리자를 소유하며, 전역 상태 대신 명시적인
/// [`RunContext`]/[`ScenarioContext`]를 통해 상태를 전달합니다.
pub struct LifecycleController<D: DriverSessionManager> {
    resolver: ConfigResolver,
    driver: D,
    state: SuiteState,
    run: Option<RunContext>,
    scenario: Option<ScenarioContext>,
    comparator: Option<Box<dyn ScreenshotComparator>>,
    summary: RunSummary,
}

fn out_of_order(hook: &'static str, state: impl fmt::Display) -> StepwiseError {
    LifecycleError::OutOfOrder {
        hook,
        state: state.to_string(),
    }
    .into()
}

impl<D: DriverSessionManager> LifecycleController<D> {
    pub fn new(resolver: ConfigResolver, driver: D) -> Self {
        Self {
            resolver,
            driver,
            state: SuiteState::Uninitialized,
            run: None,
            scenario: None,
            comparator: None,
            summary: RunSummary::default(),
        }
    }

    /// 스크린샷 비교 엔진을 지정합니다. `before_all` 전에 호출해야 적용됩니다.
    pub fn with_comparator(mut self, comparator: Box<dyn ScreenshotComparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn state(&self) -> SuiteState {
        self.state
    }

    pub fn scenario_state(&self) -> ScenarioState {
        if self.scenario.is_some() {
            ScenarioState::Running
        } else {
            ScenarioState::Idle
        }
    }

    pub fn run(&self) -> Option<&RunContext> {
        self.run.as_ref()
    }

    pub fn scenario(&self) -> Option<&ScenarioContext> {
        self.scenario.as_ref()
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// 컨트롤러를 소비하고 드라이버를 돌려받습니다.
    pub fn into_driver(self) -> D {
        self.driver
    }

    // ─── 스위트 훅 ───────────────────────────────────────────────

    /// 스위트를 시작합니다.
    ///
    /// 설정을 해석하고, 출력 디렉토리를 만들고, 드라이버 전역 상태를 초기화합니다.
    /// 실패하면 상태는 `Uninitialized`로 남고 어떤 시나리오도 실행할 수 없습니다.
    pub fn before_all(&mut self, params: &RuntimeParams) -> Result<&RunContext, StepwiseError> {
        if self.state != SuiteState::Uninitialized {
            return Err(out_of_order("before_all", self.state));
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("suite", run_id = %run_id);
        let (config, logging, settings) = span
            .in_scope(|| self.prepare_run(params))
            .inspect_err(|e| error!(run_id = %run_id, error = %e, "suite initialization failed"))?;

        let output_dir = self.resolver.layout().output_dir();
        let mut visual = VisualRecorder::new(settings, output_dir);
        if let Some(comparator) = self.comparator.take() {
            visual = visual.with_comparator(comparator);
        }

        self.state = SuiteState::SuiteReady;
        let run = self.run.insert(RunContext {
            run_id,
            config,
            logging,
            visual,
            span,
            started: Instant::now(),
        });
        Ok(run)
    }

    fn prepare_run(
        &mut self,
        params: &RuntimeParams,
    ) -> Result<(Arc<ResolvedConfig>, LoggingConfig, VisualSettings), StepwiseError> {
        let layout = self.resolver.layout();
        let logging = LoggingConfig::load(&layout.logging_path())?;
        let config = self.resolver.resolve(params)?;
        layout.ensure_output_dir()?;
        let settings = VisualSettings::from_store(&config.properties)?;

        self.driver.init_global(&config)?;
        info!(
            environment = %config.environment,
            language = %config.language,
            driver = %self.driver.name(),
            output_dir = %layout.output_dir().display(),
            "suite started"
        );
        Ok((Arc::new(config), logging, settings))
    }

    /// 스위트를 종료합니다. 여러 번 호출해도 안전합니다.
    ///
    /// `before_all`이 실패했거나 호출되지 않았다면 드라이버를 건드리지 않고 닫힌 상태가 됩니다.
    pub fn after_all(&mut self) -> Result<RunSummary, StepwiseError> {
        match self.state {
            SuiteState::SuiteClosed => {
                debug!("after_all on closed suite, ignoring");
                return Ok(self.summary);
            }
            SuiteState::Uninitialized => {
                debug!("after_all before suite start, nothing to tear down");
                self.state = SuiteState::SuiteClosed;
                return Ok(self.summary);
            }
            SuiteState::SuiteReady => {}
        }

        if let Some(open) = &self.scenario {
            return Err(out_of_order(
                "after_all",
                format_args!("scenario '{}' running", open.info.name),
            ));
        }

        let closed = self.driver.close_global();
        self.state = SuiteState::SuiteClosed;

        if let Some(run) = self.run.take() {
            let _enter = run.span.enter();
            self.summary.visual = run.visual.counters();
            info!(
                passed = self.summary.passed,
                failed = self.summary.failed,
                visual_equal = self.summary.visual.equal,
                visual_diff = self.summary.visual.diff,
                visual_baseline = self.summary.visual.baseline,
                elapsed_ms = u64::try_from(run.started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "suite finished"
            );
            if let Err(e) = &closed {
                error!(error = %e, "failed to close driver");
            }
        }

        closed?;
        Ok(self.summary)
    }

    // ─── 시나리오 훅 ─────────────────────────────────────────────

    /// 시나리오를 시작합니다.
    ///
    /// 세션 획득에 실패하면 시나리오 컨텍스트는 만들어지지 않고 `Idle`로 남습니다.
    pub fn before_scenario(&mut self, info: ScenarioInfo) -> Result<(), StepwiseError> {
        let parent = match (&self.state, &self.run) {
            (SuiteState::SuiteReady, Some(run)) => run.span.clone(),
            _ => return Err(out_of_order("before_scenario", self.state)),
        };
        if let Some(open) = &self.scenario {
            return Err(out_of_order(
                "before_scenario",
                format_args!("scenario '{}' running", open.info.name),
            ));
        }

        let span = info_span!(parent: &parent, "scenario", scenario = %info.name);
        let session = span.in_scope(|| {
            info!(tags = ?info.tags, "Running new scenario: {}", info.name);
            self.driver
                .acquire_session(&info)
                .inspect_err(|e| error!(error = %e, "failed to acquire driver session"))
        })?;

        self.scenario = Some(ScenarioContext::new(info, session, span));
        Ok(())
    }

    /// 시나리오를 종료합니다.
    ///
    /// 리소스를 생성 역순으로 해제한 뒤 드라이버에 시나리오 종료를 알립니다.
    /// 해제 실패와 드라이버 종료 실패는 로그로만 남습니다.
    pub fn after_scenario(&mut self) -> Result<ScenarioReport, StepwiseError> {
        if self.state != SuiteState::SuiteReady {
            return Err(out_of_order("after_scenario", self.state));
        }
        let Some(mut ctx) = self.scenario.take() else {
            return Err(out_of_order("after_scenario", ScenarioState::Idle));
        };

        let span = ctx.span.clone();
        let _enter = span.enter();

        let release = ctx.resources.drain_reverse();
        let result = std::mem::take(&mut ctx.result).finalize();
        if let Err(e) = self.driver.finish_scenario(ctx.session, &result) {
            warn!(error = %e, "driver failed to finish scenario");
        }

        let name = ctx.info.name;
        let duration = ctx.started.elapsed();
        match &result {
            ScenarioResult::Failed { reason } => {
                self.summary.failed += 1;
                error!("The scenario '{name}' has failed: {reason}");
            }
            _ => {
                self.summary.passed += 1;
                info!("The scenario '{name}' has passed");
            }
        }

        let label = if result.is_failed() { "failed" } else { "passed" };
        metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_RESULT => label).increment(1);
        metrics::histogram!(m::SCENARIO_DURATION_SECONDS).record(duration.as_secs_f64());

        Ok(ScenarioReport {
            name,
            result,
            released: release.released,
            release_failures: release.failures.iter().map(ToString::to_string).collect(),
            duration,
        })
    }

    // ─── 시나리오 기능 표면 ──────────────────────────────────────

    /// 현재 시나리오의 리소스 레지스트리에 페이지 객체를 등록합니다.
    pub fn register_page_object(
        &mut self,
        page_object: Box<dyn PageObject>,
    ) -> Result<(), StepwiseError> {
        let scenario = self
            .scenario
            .as_mut()
            .ok_or(LifecycleError::NoActiveScenario {
                operation: "register_page_object",
            })?;
        scenario.resources.register(page_object);
        Ok(())
    }

    /// 현재 시나리오를 실패로 표시합니다. 첫 실패 사유만 유지됩니다.
    pub fn fail_scenario(&mut self, reason: impl Into<String>) -> Result<(), StepwiseError> {
        let scenario = self
            .scenario
            .as_mut()
            .ok_or(LifecycleError::NoActiveScenario {
                operation: "fail_scenario",
            })?;
        scenario.fail(reason.into());
        Ok(())
    }

    /// 스텝 하나를 실행합니다. 모든 실패는 시나리오 실패로 기록됩니다.
    pub fn run_step(&mut self, steps: &StepRegistry, text: &str) -> Result<(), StepwiseError> {
        self.with_step_context("run_step", |ctx| steps.dispatch(ctx, text))
    }

    /// 요소 스크린샷을 기준 이미지와 비교합니다.
    pub fn assert_screenshot(
        &mut self,
        element: &ElementHandle,
        baseline: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        self.with_step_context("assert_screenshot", |ctx| {
            ctx.assert_screenshot(element, baseline, threshold)
        })
    }

    /// 전체 화면 스크린샷을 기준 이미지와 비교합니다.
    pub fn assert_full_screenshot(
        &mut self,
        baseline: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        self.with_step_context("assert_full_screenshot", |ctx| {
            ctx.assert_full_screenshot(baseline, threshold)
        })
    }

    fn with_step_context<R>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut StepContext<'_>) -> Result<R, StepwiseError>,
    ) -> Result<R, StepwiseError> {
        let (Some(run), Some(scenario)) = (self.run.as_mut(), self.scenario.as_mut()) else {
            return Err(LifecycleError::NoActiveScenario { operation }.into());
        };
        let _enter = scenario.span.clone().entered();

        let outcome = {
            let mut ctx = StepContext::new(&run.config, scenario, &mut self.driver, &mut run.visual);
            f(&mut ctx)
        };

        if let Err(e) = &outcome {
            if e.is_fatal() {
                error!(operation, error = %e, "scenario step hit a fatal error");
            } else {
                warn!(operation, error = %e, "scenario step failed");
            }
            scenario.fail(e.to_string());
        }
        outcome
    }
}

impl<D: DriverSessionManager> fmt::Debug for LifecycleController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state)
            .field("scenario_state", &self.scenario_state())
            .field("driver", &self.driver.name())
            .field("summary", &self.summary)
            .finish()
    }
}
