//! 시각 검증 HTML 보고서
//!
//! `<output>/visualtests/VisualTests.html`에 단언 결과를 한 행씩 기록합니다.
//! 요약 영역에는 기준 이미지 세트 이름과 `Visual asserts: N (M failed)`가 표시됩니다.
//!
//! 불일치(`diff`) 행은 항상 기록되고, `equal`/`baseline` 행은
//! `VisualTests.complete_report`가 켜져 있을 때만 기록됩니다.
//! 보고서는 단언마다 전체를 다시 씁니다.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::visual::VisualCounters;

/// 보고서 파일 이름
pub const REPORT_FILE: &str = "VisualTests.html";

/// 보고서 행의 결과 분류 (HTML 클래스 이름으로도 사용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportResult {
    Equal,
    Diff,
    Baseline,
}

impl ReportResult {
    fn class(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Diff => "diff",
            Self::Baseline => "baseline",
        }
    }
}

/// 단언 하나에 대한 보고서 행
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub result: ReportResult,
    /// 표시 이름 (`<suffix>` + 스크린샷 이름)
    pub name: String,
    /// 보고서 디렉토리 기준 상대 경로
    pub baseline: Option<PathBuf>,
    pub capture: Option<PathBuf>,
    pub message: Option<String>,
}

/// 스위트 범위 시각 검증 보고서
#[derive(Debug, Clone)]
pub struct VisualReport {
    path: PathBuf,
    baseline_name: String,
    rows: Vec<ReportRow>,
}

impl VisualReport {
    /// `visual_dir` 아래 보고서를 만듭니다. 첫 기록 전까지 파일은 쓰지 않습니다.
    pub fn new(visual_dir: &Path, baseline_name: &str) -> Self {
        Self {
            path: visual_dir.join(REPORT_FILE),
            baseline_name: baseline_name.to_owned(),
            rows: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// 행을 추가하고 보고서를 다시 씁니다.
    pub fn add(&mut self, row: ReportRow, counters: VisualCounters) -> io::Result<()> {
        self.rows.push(row);
        self.write(counters)
    }

    /// 현재 행과 카운터로 보고서 파일을 씁니다.
    pub fn write(&self, counters: VisualCounters) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, self.render(counters))
    }

    /// 보고서 HTML
    pub fn render(&self, counters: VisualCounters) -> String {
        let total = counters.equal + counters.diff + counters.baseline;
        let mut html = String::from(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Visual Tests</title>\n<style>\n\
             tr.equal { background-color: #dff0d8; }\n\
             tr.diff { background-color: #f2dede; }\n\
             tr.baseline { background-color: #d9edf7; }\n\
             td img { width: 100%; }\n\
             </style>\n</head>\n<body>\n<h1>Visual Tests</h1>\n<div class=\"summary\">\n",
        );
        html.push_str(&format!(
            "<p><b>Baseline name</b>: {}</p>\n",
            escape(&self.baseline_name)
        ));
        html.push_str(&format!(
            "<p><b>Visual asserts</b>: {total} ({} failed)</p>\n",
            counters.diff
        ));
        html.push_str(
            "</div>\n<table>\n<thead>\n<tr><th>Name</th><th>Baseline</th>\
             <th>Capture</th><th>Result</th></tr>\n</thead>\n<tbody>\n",
        );
        for row in &self.rows {
            html.push_str(&render_row(row));
        }
        html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
        html
    }
}

fn render_row(row: &ReportRow) -> String {
    let image = |path: &Option<PathBuf>| {
        path.as_ref().map_or_else(String::new, |p| {
            format!("<img src=\"{}\"/>", escape(&p.to_string_lossy()))
        })
    };
    format!(
        "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        row.result.class(),
        escape(&row.name),
        image(&row.baseline),
        image(&row.capture),
        escape(row.message.as_deref().unwrap_or("")),
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
