//! 시각 검증 — 스크린샷 캡처와 기준 이미지 비교 정책
//!
//! 픽셀 비교 알고리즘은 [`ScreenshotComparator`] 구현에 위임합니다.
//! 이 모듈은 캡처 저장 위치, 기준 이미지 생성/갱신, 임계값 판정,
//! 실패 정책(`VisualTests.fail`)과 결과 카운터만 담당합니다.
//!
//! # 출력 배치
//! ```text
//! <output>/visualtests/01_login_form__chrome.png
//! <output>/visualtests/baseline/<baseline_name>/login_form.png
//! <output>/visualtests/VisualTests.html
//! ```
//!
//! 접미사(드라이버 유형)는 번호가 붙은 캡처 파일에만 붙고 기준 이미지 이름에는 붙지 않습니다.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StepwiseError, VisualError};
use crate::properties::PropertyStore;
use crate::visual_report::{ReportResult, ReportRow, VisualReport};

/// 출력 디렉토리 아래 시각 검증 디렉토리 이름
pub const VISUAL_DIR: &str = "visualtests";
/// 기준 이미지 하위 디렉토리 이름
pub const BASELINE_DIR: &str = "baseline";

// ─── VisualSettings ──────────────────────────────────────────────────

/// `[VisualTests]` 섹션 설정
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualSettings {
    /// 비활성화 시 모든 단언은 캡처 없이 `Skipped`
    pub enabled: bool,
    /// 항상 기준 이미지를 덮어씀
    pub save: bool,
    /// 불일치 시 에러를 반환할지 (false면 경고 후 `Diff`)
    pub fail: bool,
    /// 호출 시 임계값이 없을 때 쓰는 기본값 (0..=1)
    pub threshold: f64,
    /// 기준 이미지 세트 이름
    pub baseline_name: String,
    /// 파일 이름 접미사 (드라이버 유형)
    pub file_suffix: Option<String>,
    /// 보고서에 equal/baseline 결과도 기록
    pub complete_report: bool,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            save: false,
            fail: true,
            threshold: 0.0,
            baseline_name: "default".to_owned(),
            file_suffix: None,
            complete_report: false,
        }
    }
}

impl VisualSettings {
    /// 해석된 프로퍼티에서 설정을 읽습니다.
    ///
    /// 접미사는 `Driver.type`에서 가져옵니다.
    pub fn from_store(store: &PropertyStore) -> Result<Self, StepwiseError> {
        let defaults = Self::default();
        let threshold = store
            .get_f64("VisualTests.threshold")?
            .unwrap_or(defaults.threshold);
        let settings = Self {
            enabled: store
                .get_bool("VisualTests.enabled")?
                .unwrap_or(defaults.enabled),
            save: store.get_bool("VisualTests.save")?.unwrap_or(defaults.save),
            fail: store.get_bool("VisualTests.fail")?.unwrap_or(defaults.fail),
            threshold: validate_threshold(threshold)?,
            baseline_name: store
                .get("VisualTests.baseline_name")
                .filter(|v| !v.is_empty())
                .map_or(defaults.baseline_name, sanitize),
            file_suffix: store
                .get("Driver.type")
                .filter(|v| !v.is_empty())
                .map(sanitize),
            complete_report: store
                .get_bool("VisualTests.complete_report")?
                .unwrap_or(defaults.complete_report),
        };
        Ok(settings)
    }
}

/// 임계값이 `[0, 1]` 범위인지 확인합니다.
pub fn validate_threshold(threshold: f64) -> Result<f64, VisualError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(VisualError::InvalidThreshold(threshold))
    }
}

/// 경로 구분자와 상위 디렉토리 참조를 `_`로 바꿔 단일 경로 구성 요소로 만듭니다.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned == "." { "_".to_owned() } else { cleaned }
}

// ─── ScreenshotComparator ────────────────────────────────────────────

/// 스크린샷 비교 엔진
pub trait ScreenshotComparator {
    /// 서로 다른 픽셀의 비율(0..=1)을 반환합니다.
    fn distance(&self, capture: &[u8], baseline: &[u8]) -> Result<f64, String>;
}

/// 바이트 단위 동일성 비교기
///
/// 동일하면 0, 다르면 1을 반환합니다. 픽셀 비교 엔진이 주입되지 않은 경우의 기본값입니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactComparator;

impl ScreenshotComparator for ExactComparator {
    fn distance(&self, capture: &[u8], baseline: &[u8]) -> Result<f64, String> {
        Ok(if capture == baseline { 0.0 } else { 1.0 })
    }
}

// ─── VisualOutcome ───────────────────────────────────────────────────

/// 스크린샷 단언 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum VisualOutcome {
    /// 시각 검증 비활성화
    Skipped,
    /// 캡처가 새 기준 이미지가 됨
    Baseline { path: PathBuf },
    /// 임계값 이내
    Equal { distance: f64 },
    /// 임계값 초과 (실패 정책이 꺼져 있을 때만 반환)
    Diff { distance: f64 },
}

impl VisualOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Baseline { .. } => "baseline",
            Self::Equal { .. } => "equal",
            Self::Diff { .. } => "diff",
        }
    }
}

/// 스위트 전체 결과 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisualCounters {
    pub equal: usize,
    pub diff: usize,
    pub baseline: usize,
}

// ─── VisualRecorder ──────────────────────────────────────────────────

/// 스위트 범위 시각 검증 상태
///
/// 캡처 번호와 결과 카운터는 스위트 전체에서 누적됩니다.
pub struct VisualRecorder {
    settings: VisualSettings,
    output_dir: PathBuf,
    comparator: Box<dyn ScreenshotComparator>,
    captures: usize,
    counters: VisualCounters,
    report: VisualReport,
}

impl VisualRecorder {
    /// 출력 디렉토리(`<output>/visualtests`의 부모)를 받아 생성합니다.
    pub fn new(settings: VisualSettings, output_dir: &Path) -> Self {
        let output_dir = output_dir.join(VISUAL_DIR);
        let report = VisualReport::new(&output_dir, &settings.baseline_name);
        Self {
            settings,
            output_dir,
            comparator: Box::new(ExactComparator),
            captures: 0,
            counters: VisualCounters::default(),
            report,
        }
    }

    pub fn with_comparator(mut self, comparator: Box<dyn ScreenshotComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn settings(&self) -> &VisualSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub fn counters(&self) -> VisualCounters {
        self.counters
    }

    pub fn visual_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn report(&self) -> &VisualReport {
        &self.report
    }

    /// 기준 이미지 경로 (접미사 없음)
    pub fn baseline_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(BASELINE_DIR)
            .join(&self.settings.baseline_name)
            .join(format!("{}.png", sanitize(name)))
    }

    fn file_name(&self, name: &str) -> String {
        let name = sanitize(name);
        match &self.settings.file_suffix {
            Some(suffix) => format!("{name}__{suffix}"),
            None => name,
        }
    }

    fn report_name(&self, name: &str) -> String {
        match &self.settings.file_suffix {
            Some(suffix) => format!("{suffix} ({name})"),
            None => name.to_owned(),
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.output_dir)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    /// 보고서에 행을 기록합니다. equal/baseline은 `complete_report`일 때만 기록됩니다.
    fn record(
        &mut self,
        result: ReportResult,
        name: &str,
        capture: &Path,
        baseline: &Path,
        message: Option<String>,
    ) -> Result<(), StepwiseError> {
        if result != ReportResult::Diff && !self.settings.complete_report {
            self.report.write(self.counters)?;
            return Ok(());
        }
        let row = ReportRow {
            result,
            name: self.report_name(name),
            baseline: (result != ReportResult::Baseline).then(|| self.relative(baseline)),
            capture: Some(self.relative(capture)),
            message,
        };
        self.report.add(row, self.counters)?;
        Ok(())
    }

    /// 캡처를 저장하고 기준 이미지와 비교합니다.
    ///
    /// `threshold`가 없으면 설정의 기본 임계값을 사용합니다.
    /// 비활성화 상태면 아무것도 쓰지 않고 `Skipped`를 반환합니다.
    ///
    /// # Errors
    ///
    /// - 임계값이 범위를 벗어나면 `VisualError::InvalidThreshold`
    /// - 불일치이고 `fail` 정책이 켜져 있으면 `VisualError::Mismatch`
    /// - 비교기 실패 또는 유한하지 않은 거리 값이면 `VisualError::ComparisonFailed`
    pub fn assert_capture(
        &mut self,
        capture: &[u8],
        name: &str,
        threshold: Option<f64>,
    ) -> Result<VisualOutcome, StepwiseError> {
        if !self.settings.enabled {
            return Ok(VisualOutcome::Skipped);
        }
        let threshold = validate_threshold(threshold.unwrap_or(self.settings.threshold))?;

        let file_name = self.file_name(name);
        self.captures += 1;
        fs::create_dir_all(&self.output_dir)?;
        let capture_path = self
            .output_dir
            .join(format!("{:02}_{file_name}.png", self.captures));
        fs::write(&capture_path, capture)?;

        let baseline_path = self.baseline_path(name);
        let outcome = if self.settings.save || !baseline_path.exists() {
            if let Some(parent) = baseline_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&baseline_path, capture)?;
            info!(baseline = %baseline_path.display(), "screenshot saved as baseline");
            self.counters.baseline += 1;
            self.record(
                ReportResult::Baseline,
                name,
                &capture_path,
                &baseline_path,
                Some("Screenshot added to baseline".to_owned()),
            )?;
            VisualOutcome::Baseline {
                path: baseline_path,
            }
        } else {
            let baseline = fs::read(&baseline_path)?;
            let distance = self
                .comparator
                .distance(capture, &baseline)
                .map_err(|reason| VisualError::ComparisonFailed {
                    baseline: name.to_owned(),
                    reason,
                })?;
            if !distance.is_finite() {
                return Err(VisualError::ComparisonFailed {
                    baseline: name.to_owned(),
                    reason: format!("comparator returned a non-finite distance ({distance})"),
                }
                .into());
            }

            if distance > threshold {
                self.counters.diff += 1;
                let mismatch = VisualError::Mismatch {
                    baseline: name.to_owned(),
                    distance,
                    threshold,
                };
                self.record(
                    ReportResult::Diff,
                    name,
                    &capture_path,
                    &baseline_path,
                    Some(mismatch.to_string()),
                )?;
                metrics::counter!(
                    crate::metrics::VISUAL_ASSERTIONS_TOTAL,
                    crate::metrics::LABEL_OUTCOME => "diff"
                )
                .increment(1);
                if self.settings.fail {
                    return Err(mismatch.into());
                }
                warn!(
                    baseline = %name,
                    distance,
                    threshold,
                    capture = %capture_path.display(),
                    "screenshot differs from baseline"
                );
                return Ok(VisualOutcome::Diff { distance });
            }

            self.counters.equal += 1;
            self.record(ReportResult::Equal, name, &capture_path, &baseline_path, None)?;
            VisualOutcome::Equal { distance }
        };

        metrics::counter!(
            crate::metrics::VISUAL_ASSERTIONS_TOTAL,
            crate::metrics::LABEL_OUTCOME => outcome.label()
        )
        .increment(1);
        Ok(outcome)
    }
}

impl std::fmt::Debug for VisualRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualRecorder")
            .field("settings", &self.settings)
            .field("output_dir", &self.output_dir)
            .field("captures", &self.captures)
            .field("counters", &self.counters)
            .finish()
    }
}
