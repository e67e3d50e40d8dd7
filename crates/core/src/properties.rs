//! 프로퍼티 저장소 — 계층형 키/값 설정과 파일 파서
//!
//! [`PropertyStore`]는 대소문자를 구분하는 문자열 키/값 매핑입니다.
//! 병합 시 나중에 쓴 값이 이깁니다 (last-writer-wins).
//!
//! # 프로퍼티 파일 문법
//! ```text
//! # 주석 (';' 도 가능)
//! [Driver]
//! type = firefox          → Driver.type
//! window_width: 1024      → Driver.window_width
//! ```
//! 섹션 헤더가 없으면 키는 그대로 저장됩니다.
//!
//! # 환경 JSON
//! 중첩 객체는 `.`으로 평탄화됩니다.
//! `{"Driver": {"type": "chrome"}}` → `Driver.type = chrome`

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

/// 키/값 설정 저장소
///
/// 키 순서는 결정적(정렬)이며, 키마다 유효한 값은 정확히 하나입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyStore {
    entries: BTreeMap<String, String>,
}

impl PropertyStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 키/값 쌍 목록에서 저장소를 생성합니다. 중복 키는 마지막 값이 남습니다.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (k, v) in pairs {
            store.insert(k, v);
        }
        store
    }

    /// 값을 저장합니다. 이전 값이 있으면 반환합니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// 다른 저장소를 위에 덮어씁니다.
    ///
    /// 같은 키는 `overlay`의 값으로 교체되며, 교체된 키 수를 반환합니다.
    pub fn merge(&mut self, overlay: &PropertyStore) -> usize {
        let mut overridden = 0;
        for (key, value) in &overlay.entries {
            if self.entries.insert(key.clone(), value.clone()).is_some() {
                overridden += 1;
            }
        }
        overridden
    }

    /// 키의 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// 키의 값을 조회하고, 없으면 기본값을 반환합니다.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// 불리언 값을 조회합니다.
    ///
    /// `true/yes/on/1`, `false/no/off/0` (대소문자 무시)만 허용합니다.
    /// 키가 없으면 `Ok(None)`, 해석할 수 없으면 `InvalidValue`입니다.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                field: key.to_owned(),
                reason: format!("'{raw}' is not a boolean"),
            }),
        }
    }

    /// 실수 값을 조회합니다.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: key.to_owned(),
                reason: format!("'{raw}' is not a number"),
            })
    }

    /// 키 존재 여부
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 저장된 키 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 모든 키/값을 키 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `section.` 접두어를 가진 키들을 접두어 없이 순회합니다.
    pub fn section<'a>(&'a self, name: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let prefix = format!("{name}.");
        let skip = prefix.len();
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(move |(k, v)| (&k[skip..], v.as_str()))
    }

    /// 저장소에 나타나는 섹션 이름 목록 (중복 제거, 정렬)
    pub fn section_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter_map(|k| k.split_once('.').map(|(section, _)| section))
            .collect();
        names.dedup();
        names
    }
}

// ─── 파서 ────────────────────────────────────────────────────────────

/// 프로퍼티 파일 문자열을 파싱합니다.
///
/// `origin`은 에러 메시지에 표시할 파일 경로입니다.
pub fn parse_properties(content: &str, origin: &str) -> Result<PropertyStore, ConfigError> {
    let mut store = PropertyStore::new();
    let mut section: Option<String> = None;

    for (idx, raw_line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| malformed(origin, line_no, "invalid section header"))?;
            section = Some(name.to_owned());
            continue;
        }

        // 첫 번째로 나타나는 구분자가 키/값을 나눕니다.
        let sep = line
            .find(['=', ':'])
            .ok_or_else(|| malformed(origin, line_no, "expected 'key = value' or 'key: value'"))?;
        let key = line[..sep].trim();
        let value = line[sep + 1..].trim();
        if key.is_empty() {
            return Err(malformed(origin, line_no, "empty key"));
        }

        let full_key = match &section {
            Some(section) => format!("{section}.{key}"),
            None => key.to_owned(),
        };
        store.insert(full_key, value);
    }

    Ok(store)
}

/// 환경 JSON 문자열을 파싱하여 평탄화된 저장소로 변환합니다.
///
/// 최상위는 JSON 객체여야 합니다. 중첩 객체는 `.`으로 연결되고,
/// `null`은 건너뛰며, 배열은 압축 JSON 문자열로 저장됩니다.
pub fn parse_json_properties(content: &str, origin: &str) -> Result<PropertyStore, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(|e| ConfigError::Malformed {
        path: origin.to_owned(),
        line: e.line(),
        reason: e.to_string(),
    })?;

    let Value::Object(map) = value else {
        return Err(malformed(origin, 1, "top-level value must be a JSON object"));
    };

    let mut store = PropertyStore::new();
    for (key, value) in &map {
        flatten_json(&mut store, key, value);
    }
    Ok(store)
}

fn flatten_json(store: &mut PropertyStore, prefix: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            store.insert(prefix, s.as_str());
        }
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
            store.insert(prefix, value.to_string());
        }
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_json(store, &format!("{prefix}.{key}"), nested);
            }
        }
    }
}

/// 파일 읽기 결과
///
/// 파일이 없으면 `Ok(None)`을 반환하여 호출자가 건너뛸 수 있게 합니다.
pub fn read_optional(path: &Path) -> Result<Option<String>, std::io::Error> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn malformed(origin: &str, line: usize, reason: &str) -> ConfigError {
    ConfigError::Malformed {
        path: origin.to_owned(),
        line,
        reason: reason.to_owned(),
    }
}
