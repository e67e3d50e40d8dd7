//! 설정 관리 — 설정 파일 배치, 런타임 파라미터, 설정 리졸버
//!
//! [`ConfigResolver`]는 여러 프로퍼티 소스를 정해진 우선순위로 병합하여
//! 실행당 하나의 유효 설정([`ResolvedConfig`])을 만듭니다.
//!
//! # 설정 로딩 우선순위
//! 1. 언어 오버레이 (`language/{lang}_{item}.cfg`) — 전역이 아닌 항목별 네임스페이스
//! 2. 환경 오버레이 (`{env}-properties.json`)
//! 3. 프레임워크 설정 (`toolium.conf`)
//!
//! 누락된 파일은 에러가 아닙니다. 프레임워크 설정이 존재하지만
//! 형식이 잘못된 경우에만 [`ConfigError::Malformed`]로 실패합니다.
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), stepwise_core::error::StepwiseError> {
//! use stepwise_core::config::{ConfigLayout, ConfigResolver, RuntimeParams};
//!
//! let layout = ConfigLayout::new("settings", "_output");
//! let resolved = ConfigResolver::new(layout).resolve(&RuntimeParams::new("PRE", "EN"))?;
//! let browser = resolved.properties.get_or("Driver.type", "firefox");
//! # let _ = browser;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, StepwiseError};
use crate::properties::{PropertyStore, parse_json_properties, parse_properties, read_optional};

/// 프레임워크 설정 파일 이름
pub const FRAMEWORK_FILE: &str = "toolium.conf";
/// 로깅 설정 파일 이름
pub const LOGGING_FILE: &str = "logging.conf";
/// 환경 설정 파일 이름 패턴 (`{env}`이 환경 이름으로 치환됨)
pub const ENVIRONMENT_FILE_PATTERN: &str = "{env}-properties.json";
/// 언어 설정 하위 디렉토리
pub const LANGUAGE_DIR: &str = "language";
/// 언어 설정 파일 확장자
pub const LANGUAGE_FILE_EXTENSION: &str = "cfg";
/// 스위트 로그 파일 이름
pub const OUTPUT_LOG_FILE: &str = "acceptance_int.log";

/// 환경변수 오버라이드 키
pub const ENV_ENVIRONMENT: &str = "STEPWISE_ENVIRONMENT";
/// 언어 환경변수 오버라이드 키
pub const ENV_LANGUAGE: &str = "STEPWISE_LANGUAGE";

// ─── ConfigLayout ────────────────────────────────────────────────────

/// 설정/출력 파일의 파일시스템 배치
///
/// 각 경로는 빌더 스타일 setter로 바꿀 수 있습니다.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigLayout {
    config_dir: PathBuf,
    language_dir: PathBuf,
    framework_file: String,
    logging_file: String,
    environment_pattern: String,
    output_dir: PathBuf,
    output_log_file: String,
}

impl ConfigLayout {
    /// 기본 파일 이름으로 배치를 생성합니다.
    ///
    /// 언어 디렉토리는 `<config_dir>/language`입니다.
    pub fn new(config_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            language_dir: config_dir.join(LANGUAGE_DIR),
            config_dir,
            framework_file: FRAMEWORK_FILE.to_owned(),
            logging_file: LOGGING_FILE.to_owned(),
            environment_pattern: ENVIRONMENT_FILE_PATTERN.to_owned(),
            output_dir: output_dir.into(),
            output_log_file: OUTPUT_LOG_FILE.to_owned(),
        }
    }

    /// 언어 디렉토리를 지정합니다.
    pub fn with_language_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.language_dir = dir.into();
        self
    }

    /// 프레임워크 설정 파일 이름을 지정합니다.
    pub fn with_framework_file(mut self, name: impl Into<String>) -> Self {
        self.framework_file = name.into();
        self
    }

    /// 로깅 설정 파일 이름을 지정합니다.
    pub fn with_logging_file(mut self, name: impl Into<String>) -> Self {
        self.logging_file = name.into();
        self
    }

    /// 환경 설정 파일 이름 패턴을 지정합니다. `{env}`를 포함해야 합니다.
    pub fn with_environment_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.environment_pattern = pattern.into();
        self
    }

    /// 스위트 로그 파일 이름을 지정합니다.
    pub fn with_output_log_file(mut self, name: impl Into<String>) -> Self {
        self.output_log_file = name.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn language_dir(&self) -> &Path {
        &self.language_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn framework_path(&self) -> PathBuf {
        self.config_dir.join(&self.framework_file)
    }

    pub fn logging_path(&self) -> PathBuf {
        self.config_dir.join(&self.logging_file)
    }

    /// 환경 이름을 패턴에 넣어 환경 설정 파일 경로를 만듭니다.
    pub fn environment_path(&self, environment: &str) -> PathBuf {
        self.config_dir
            .join(self.environment_pattern.replace("{env}", environment))
    }

    pub fn output_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_log_file)
    }

    /// 출력 디렉토리가 없으면 생성합니다.
    pub fn ensure_output_dir(&self) -> Result<(), StepwiseError> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

// ─── RuntimeParams ───────────────────────────────────────────────────

/// 리졸버의 외부 조정 가능한 입력 (환경, 언어)
///
/// 값은 항상 소문자로 정규화되어 저장됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeParams {
    environment: String,
    language: String,
}

impl RuntimeParams {
    /// 기본 환경 이름
    pub const DEFAULT_ENVIRONMENT: &'static str = "QA";
    /// 기본 언어 코드
    pub const DEFAULT_LANGUAGE: &'static str = "ES";

    pub fn new(environment: &str, language: &str) -> Self {
        Self {
            environment: fold(environment),
            language: fold(language),
        }
    }

    /// 이름 있는 사용자 데이터(`-D environment=PRE`)에서 파라미터를 만듭니다.
    ///
    /// 우선순위: 사용자 데이터 > 환경변수 > 기본값
    pub fn from_userdata(userdata: &BTreeMap<String, String>) -> Self {
        let mut params = Self::default();
        params.apply_env_overrides();
        if let Some(environment) = userdata.get("environment") {
            params.environment = fold(environment);
        }
        if let Some(language) = userdata.get("language") {
            params.language = fold(language);
        }
        params
    }

    /// 환경변수로 값을 오버라이드합니다.
    ///
    /// `STEPWISE_ENVIRONMENT`, `STEPWISE_LANGUAGE`
    pub fn apply_env_overrides(&mut self) {
        override_folded(&mut self.environment, ENV_ENVIRONMENT);
        override_folded(&mut self.language, ENV_LANGUAGE);
    }

    /// 파일 이름에 삽입될 값이므로 경로 구성 요소가 될 수 없는 값을 거부합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("environment", &self.environment), ("language", &self.language)] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
            if value.contains(['/', '\\']) || value.contains("..") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("'{value}' must not contain path separators"),
                });
            }
        }
        Ok(())
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Default for RuntimeParams {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENVIRONMENT, Self::DEFAULT_LANGUAGE)
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

fn override_folded(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        if val.trim().is_empty() {
            warn!(env_key, "empty value in env var, ignoring");
        } else {
            *target = fold(&val);
        }
    }
}

// ─── LoggingConfig ───────────────────────────────────────────────────

/// 로깅 설정 (`logging.conf`의 `[logging]` 섹션)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub level: String,
    /// 로그 형식 (json, pretty, compact)
    pub format: String,
    /// 출력 디렉토리의 스위트 로그 파일에 기록할지 여부
    pub file: bool,
    /// 표준 에러로도 출력할지 여부
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            file: true,
            console: true,
        }
    }
}

impl LoggingConfig {
    /// 로깅 설정 파일을 읽습니다. 파일이 없으면 기본값을 사용합니다.
    pub fn load(path: &Path) -> Result<Self, StepwiseError> {
        let origin = path.display().to_string();
        let Some(content) = read_optional(path)? else {
            debug!(path = %origin, "logging config not found, using defaults");
            return Ok(Self::default());
        };
        let store = parse_properties(&content, &origin)?;
        Ok(Self::from_store(&store)?)
    }

    /// 저장소의 `logging.*` 키에서 설정을 만들고 검증합니다.
    pub fn from_store(store: &PropertyStore) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            level: store
                .get("logging.level")
                .map_or(defaults.level, str::to_lowercase),
            format: store
                .get("logging.format")
                .map_or(defaults.format, str::to_lowercase),
            file: store.get_bool("logging.file")?.unwrap_or(defaults.file),
            console: store.get_bool("logging.console")?.unwrap_or(defaults.console),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty", "compact"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        if !self.file && !self.console {
            return Err(ConfigError::InvalidValue {
                field: "logging.console".to_owned(),
                reason: "at least one of 'file' or 'console' must be enabled".to_owned(),
            });
        }

        Ok(())
    }
}

// ─── ResolvedConfig ──────────────────────────────────────────────────

/// 설정 소스의 역할
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "item", rename_all = "lowercase")]
pub enum SourceRole {
    Framework,
    Environment,
    Language(String),
}

/// 설정 소스 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    /// 로드됨 (키 수)
    Loaded { keys: usize },
    /// 파일 없음
    Missing,
    /// 존재하지만 선택 소스라서 건너뜀
    Skipped { reason: String },
}

/// 리졸버가 검토한 소스 하나에 대한 보고
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    #[serde(flatten)]
    pub role: SourceRole,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// 언어 오버레이 — 항목(UI 요소 그룹) 이름별 키/값 집합
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LanguageOverlays {
    items: BTreeMap<String, PropertyStore>,
}

impl LanguageOverlays {
    /// 항목의 텍스트 집합을 조회합니다.
    pub fn item(&self, item: &str) -> Option<&PropertyStore> {
        self.items.get(item)
    }

    /// 항목 안의 키 하나를 조회합니다.
    pub fn text(&self, item: &str, key: &str) -> Option<&str> {
        self.items.get(item).and_then(|store| store.get(key))
    }

    /// 항목 이름 목록 (정렬)
    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, item: String, store: PropertyStore) {
        self.items.insert(item, store);
    }
}

/// 한 번의 실행에 대한 유효 설정
///
/// 스위트 시작 후에는 읽기 전용으로 공유됩니다.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// 정규화된 환경 이름
    pub environment: String,
    /// 정규화된 언어 코드
    pub language: String,
    /// 프레임워크 + 환경 병합 결과
    pub properties: PropertyStore,
    /// 언어 오버레이 (전역 네임스페이스와 분리)
    pub languages: LanguageOverlays,
    /// 검토한 소스 목록 (로딩 순서)
    pub sources: Vec<SourceReport>,
}

impl ResolvedConfig {
    /// 빈 설정 (모든 소스가 누락된 경우와 동일)
    pub fn empty(params: &RuntimeParams) -> Self {
        Self {
            environment: params.environment().to_owned(),
            language: params.language().to_owned(),
            properties: PropertyStore::new(),
            languages: LanguageOverlays::default(),
            sources: Vec::new(),
        }
    }
}

// ─── ConfigResolver ──────────────────────────────────────────────────

/// 설정 리졸버
///
/// 프레임워크 → 환경 → 언어 순으로 소스를 읽어 [`ResolvedConfig`]를 만듭니다.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    layout: ConfigLayout,
}

impl ConfigResolver {
    pub fn new(layout: ConfigLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ConfigLayout {
        &self.layout
    }

    /// 설정을 해석합니다.
    ///
    /// # Errors
    ///
    /// - 프레임워크 설정이 존재하지만 형식이 잘못된 경우 `ConfigError::Malformed`
    /// - 런타임 파라미터가 경로로 쓸 수 없는 값인 경우 `ConfigError::InvalidValue`
    pub fn resolve(&self, params: &RuntimeParams) -> Result<ResolvedConfig, StepwiseError> {
        params.validate()?;
        let started = Instant::now();
        let mut resolved = ResolvedConfig::empty(params);

        self.load_framework(&mut resolved)?;
        self.load_environment(&mut resolved, params.environment());
        self.load_languages(&mut resolved, params.language());

        metrics::histogram!(crate::metrics::CONFIG_RESOLVE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(
            environment = %resolved.environment,
            language = %resolved.language,
            keys = resolved.properties.len(),
            language_items = resolved.languages.len(),
            "configuration resolved"
        );
        Ok(resolved)
    }

    fn load_framework(&self, resolved: &mut ResolvedConfig) -> Result<(), StepwiseError> {
        let path = self.layout.framework_path();
        let origin = path.display().to_string();

        let status = match read_optional(&path)? {
            None => {
                warn!(path = %origin, "framework config not found, using empty base layer");
                SourceStatus::Missing
            }
            Some(content) => {
                let store = parse_properties(&content, &origin)?;
                debug!(path = %origin, keys = store.len(), "framework config loaded");
                let keys = store.len();
                resolved.properties = store;
                SourceStatus::Loaded { keys }
            }
        };

        resolved.sources.push(SourceReport {
            role: SourceRole::Framework,
            path,
            status,
        });
        Ok(())
    }

    fn load_environment(&self, resolved: &mut ResolvedConfig, environment: &str) {
        let path = self.layout.environment_path(environment);
        let origin = path.display().to_string();

        let status = match read_optional(&path) {
            Ok(None) => {
                debug!(path = %origin, environment, "environment config not found, skipping");
                SourceStatus::Missing
            }
            Ok(Some(content)) => match parse_json_properties(&content, &origin) {
                Ok(store) => {
                    let overridden = resolved.properties.merge(&store);
                    debug!(
                        path = %origin,
                        keys = store.len(),
                        overridden,
                        "environment config merged"
                    );
                    SourceStatus::Loaded { keys: store.len() }
                }
                Err(e) => {
                    warn!(path = %origin, error = %e, "malformed environment config, skipping");
                    SourceStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(path = %origin, error = %e, "unreadable environment config, skipping");
                SourceStatus::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        resolved.sources.push(SourceReport {
            role: SourceRole::Environment,
            path,
            status,
        });
    }

    fn load_languages(&self, resolved: &mut ResolvedConfig, language: &str) {
        let dir = self.layout.language_dir();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "language directory not readable, skipping");
                return;
            }
        };

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| language_item(&path, language).map(|item| (item, path)))
            .collect();
        files.sort();

        for (item, path) in files {
            let origin = path.display().to_string();
            let status = match std::fs::read_to_string(&path) {
                Ok(content) => match parse_properties(&content, &origin) {
                    Ok(store) => {
                        let keys = store.len();
                        debug!(path = %origin, item = %item, keys, "language overlay loaded");
                        resolved.languages.insert(item.clone(), store);
                        SourceStatus::Loaded { keys }
                    }
                    Err(e) => {
                        warn!(path = %origin, error = %e, "malformed language file, skipping");
                        SourceStatus::Skipped {
                            reason: e.to_string(),
                        }
                    }
                },
                Err(e) => {
                    warn!(path = %origin, error = %e, "unreadable language file, skipping");
                    SourceStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            resolved.sources.push(SourceReport {
                role: SourceRole::Language(item),
                path,
                status,
            });
        }
    }
}

/// `{language}_{item}.cfg` 형식이면 항목 이름을 반환합니다.
fn language_item(path: &Path, language: &str) -> Option<String> {
    if path.extension()?.to_str()? != LANGUAGE_FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let item = stem.strip_prefix(language)?.strip_prefix('_')?;
    (!item.is_empty()).then(|| item.to_owned())
}

/// 설정 디렉토리에서 바로 설정을 해석합니다.
///
/// 출력 디렉토리는 사용하지 않으므로 `<config_dir>/_output`으로 둡니다.
pub fn resolve(
    config_dir: &Path,
    environment: &str,
    language: &str,
) -> Result<ResolvedConfig, StepwiseError> {
    let layout = ConfigLayout::new(config_dir, config_dir.join("_output"));
    ConfigResolver::new(layout).resolve(&RuntimeParams::new(environment, language))
}
