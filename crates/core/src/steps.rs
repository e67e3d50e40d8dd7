//! 스텝 레지스트리 — 스텝 텍스트를 명시적으로 등록된 핸들러에 연결
//!
//! 패턴의 `{name}` 자리표시자는 인자로 캡처됩니다.
//! 디스패치는 정확히 하나의 정의와 일치해야 하며, 문자열을 코드로
//! 평가하지 않고 레지스트리 조회로만 핸들러를 찾습니다.
//!
//! ```
//! use stepwise_core::steps::StepRegistry;
//!
//! let mut steps = StepRegistry::new();
//! steps
//!     .register("I log in as \"{user}\"", |_ctx, args| {
//!         let _user = args.require("user")?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(steps.len(), 1);
//! ```

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::driver::DriverSessionManager;
use crate::error::{DriverError, StepError, StepwiseError};
use crate::lifecycle::ScenarioContext;
use crate::registry::{PageElement, PageObject};
use crate::types::{ElementHandle, ScenarioInfo};
use crate::visual::{VisualOutcome, VisualRecorder};

/// 요소 표시 여부 내장 스텝
pub const ELEMENT_DISPLAYED_STEP: &str = "the \"{element}\" element is displayed";
/// 요소 스크린샷 비교 내장 스텝
pub const ELEMENT_SCREENSHOT_STEP: &str =
    "the \"{element}\" element matches the \"{baseline}\" screenshot";
/// 전체 화면 스크린샷 비교 내장 스텝
pub const SCREEN_SCREENSHOT_STEP: &str = "the screen matches the \"{baseline}\" screenshot";

/// 스텝 핸들러
pub type StepHandler = Box<dyn Fn(&mut StepContext<'_>, &StepArgs) -> Result<(), StepwiseError>>;

// ─── StepArgs ────────────────────────────────────────────────────────

/// 패턴 자리표시자에서 캡처한 인자
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: BTreeMap<String, String>,
}

impl StepArgs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// 인자를 조회하고, 없으면 스텝 실패로 처리합니다.
    pub fn require(&self, name: &str) -> Result<&str, StepError> {
        self.get(name)
            .ok_or_else(|| StepError::Failed(format!("missing step argument '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ─── StepContext ─────────────────────────────────────────────────────

/// 스텝 핸들러에 노출되는 기능 표면
///
/// 활성 시나리오, 드라이버 세션, 시각 검증 상태에 바인딩됩니다.
/// 전역 설정은 읽기 전용으로만 노출됩니다.
pub struct StepContext<'a> {
    config: &'a ResolvedConfig,
    scenario: &'a mut ScenarioContext,
    driver: &'a mut dyn DriverSessionManager,
    visual: &'a mut VisualRecorder,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(
        config: &'a ResolvedConfig,
        scenario: &'a mut ScenarioContext,
        driver: &'a mut dyn DriverSessionManager,
        visual: &'a mut VisualRecorder,
    ) -> Self {
        Self {
            config,
            scenario,
            driver,
            visual,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        self.config
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.config.properties.get(key)
    }

    /// 언어 오버레이에서 항목별 텍스트를 조회합니다.
    pub fn language_text(&self, item: &str, key: &str) -> Option<&str> {
        self.config.languages.text(item, key)
    }

    pub fn scenario(&self) -> &ScenarioInfo {
        self.scenario.info()
    }

    /// 현재 시나리오의 리소스 레지스트리에 페이지 객체를 등록합니다.
    pub fn register_page_object(&mut self, page_object: Box<dyn PageObject>) {
        self.scenario.resources.register(page_object);
    }

    /// 등록된 페이지 객체에서 요소를 찾습니다 (최근 등록 순).
    pub fn find_element(&self, name: &str) -> Result<&dyn PageElement, DriverError> {
        self.scenario
            .resources
            .find_element(name)
            .ok_or_else(|| DriverError::ElementNotFound(name.to_owned()))
    }

    /// 요소 스크린샷을 기준 이미지와 비교합니다.
    pub fn assert_screenshot(
        &mut self,
        element: &ElementHandle,
        baseline: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        self.capture_and_compare(Some(element), baseline, threshold)
    }

    /// 전체 화면 스크린샷을 기준 이미지와 비교합니다.
    pub fn assert_full_screenshot(
        &mut self,
        baseline: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        self.capture_and_compare(None, baseline, threshold)
    }

    fn capture_and_compare(
        &mut self,
        element: Option<&ElementHandle>,
        baseline: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        if !self.visual.is_enabled() {
            debug!(baseline, "visual tests disabled, skipping screenshot assertion");
            return Ok(VisualOutcome::Skipped);
        }
        let capture = self
            .driver
            .capture_screenshot(&self.scenario.session, element)?;
        self.visual.assert_capture(&capture, baseline, threshold)
    }
}

// ─── StepRegistry ────────────────────────────────────────────────────

struct StepDefinition {
    pattern: String,
    regex: Regex,
    handler: StepHandler,
}

/// 패턴 → 핸들러 레지스트리
#[derive(Default)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 내장 스텝(요소 표시, 스크린샷 비교)이 등록된 레지스트리
    pub fn with_builtin_steps() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_steps();
        registry
    }

    fn register_builtin_steps(&mut self) {
        let builtins: [(&str, StepHandler); 3] = [
            (ELEMENT_DISPLAYED_STEP, Box::new(element_is_displayed)),
            (ELEMENT_SCREENSHOT_STEP, Box::new(element_matches_screenshot)),
            (SCREEN_SCREENSHOT_STEP, Box::new(screen_matches_screenshot)),
        ];
        for (pattern, handler) in builtins {
            // 내장 패턴은 고정 문자열이며 빈 레지스트리에 등록됩니다.
            if let Ok(regex) = compile_pattern(pattern) {
                self.steps.push(StepDefinition {
                    pattern: pattern.to_owned(),
                    regex,
                    handler,
                });
            }
        }
    }

    /// 스텝 정의를 등록합니다.
    ///
    /// # Errors
    ///
    /// - 동일한 패턴이 이미 있으면 `StepError::AlreadyRegistered`
    /// - 자리표시자 문법 오류는 `StepError::InvalidPattern`
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<(), StepError>
    where
        F: Fn(&mut StepContext<'_>, &StepArgs) -> Result<(), StepwiseError> + 'static,
    {
        if self.steps.iter().any(|s| s.pattern == pattern) {
            return Err(StepError::AlreadyRegistered {
                pattern: pattern.to_owned(),
            });
        }
        let regex = compile_pattern(pattern)?;
        self.steps.push(StepDefinition {
            pattern: pattern.to_owned(),
            regex,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 등록 순서대로 패턴 목록을 반환합니다.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.pattern.as_str())
    }

    /// 텍스트와 일치하는 유일한 정의와 캡처된 인자를 찾습니다.
    pub fn resolve(&self, text: &str) -> Result<(&str, StepArgs), StepError> {
        let (definition, args) = self.find(text)?;
        Ok((definition.pattern.as_str(), args))
    }

    fn find(&self, text: &str) -> Result<(&StepDefinition, StepArgs), StepError> {
        let text = text.trim();
        let mut matches = self
            .steps
            .iter()
            .filter_map(|step| step.regex.captures(text).map(|caps| (step, caps)));

        let Some((definition, caps)) = matches.next() else {
            return Err(StepError::Undefined {
                text: text.to_owned(),
            });
        };

        let others: Vec<&str> = matches.map(|(s, _)| s.pattern.as_str()).collect();
        if !others.is_empty() {
            let patterns = std::iter::once(definition.pattern.as_str())
                .chain(others)
                .map(|p| format!("'{p}'"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(StepError::Ambiguous {
                text: text.to_owned(),
                patterns,
            });
        }

        let values = definition
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.to_owned(), m.as_str().to_owned()))
            })
            .collect();
        Ok((definition, StepArgs { values }))
    }

    /// 텍스트에 맞는 스텝 핸들러를 실행합니다.
    pub fn dispatch(&self, ctx: &mut StepContext<'_>, text: &str) -> Result<(), StepwiseError> {
        let (definition, args) = self.find(text)?;
        debug!(step = %text.trim(), pattern = %definition.pattern, "step matched");
        (definition.handler)(ctx, &args)
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> StepError {
    StepError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: reason.into(),
    }
}

/// `{name}` 자리표시자를 이름 있는 캡처 그룹으로 바꿔 앵커된 정규식을 만듭니다.
fn compile_pattern(pattern: &str) -> Result<Regex, StepError> {
    let mut source = String::from("^");
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        let literal = &rest[..start];
        if literal.contains('}') {
            return Err(invalid(pattern, "unmatched '}'"));
        }
        source.push_str(&regex::escape(literal));

        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| invalid(pattern, "unclosed '{'"))?;
        let name = &after[..end];
        let valid_name = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(invalid(pattern, format!("invalid placeholder name '{name}'")));
        }
        source.push_str(&format!("(?P<{name}>.+?)"));
        rest = &after[end + 1..];
    }

    if rest.contains('}') {
        return Err(invalid(pattern, "unmatched '}'"));
    }
    source.push_str(&regex::escape(rest));
    source.push('$');

    Regex::new(&source).map_err(|e| invalid(pattern, e.to_string()))
}

// ─── 내장 스텝 ───────────────────────────────────────────────────────

fn element_is_displayed(ctx: &mut StepContext<'_>, args: &StepArgs) -> Result<(), StepwiseError> {
    let name = args.require("element")?;
    let element = ctx.find_element(name)?;
    if element.is_displayed()? {
        Ok(())
    } else {
        Err(StepError::Failed(format!("element '{name}' is not displayed")).into())
    }
}

fn element_matches_screenshot(
    ctx: &mut StepContext<'_>,
    args: &StepArgs,
) -> Result<(), StepwiseError> {
    let handle = ctx.find_element(args.require("element")?)?.handle();
    ctx.assert_screenshot(&handle, args.require("baseline")?, None)?;
    Ok(())
}

fn screen_matches_screenshot(
    ctx: &mut StepContext<'_>,
    args: &StepArgs,
) -> Result<(), StepwiseError> {
    ctx.assert_full_screenshot(args.require("baseline")?, None)?;
    Ok(())
}
