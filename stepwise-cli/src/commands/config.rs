//! `stepwise config` command handler

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::info;

use stepwise_core::config::{LoggingConfig, RuntimeParams, SourceReport, SourceStatus};
use stepwise_core::visual::VisualSettings;
use stepwise_harness::Project;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub fn execute(
    args: ConfigArgs,
    project: &Project,
    params: &RuntimeParams,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => {
            let report = validate(project, params);
            writer.render(&report)?;
            if report.valid {
                Ok(())
            } else {
                Err(CliError::Config(format!(
                    "{} error(s) found",
                    report.errors.len()
                )))
            }
        }
        ConfigAction::Show { section } => {
            let report = show(project, params, section)?;
            writer.render(&report)
        }
    }
}

/// Resolve the configuration and collect the effective properties.
///
/// # Errors
///
/// Returns `CliError::Core` if resolution fails, or `CliError::Command`
/// if `section` names a section that has no keys.
pub fn show(
    project: &Project,
    params: &RuntimeParams,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    info!(root = %project.root().display(), "resolving configuration");
    let resolved = project.resolver().resolve(params)?;

    let properties: BTreeMap<String, String> = match &section {
        Some(name) => {
            let entries: BTreeMap<String, String> = resolved
                .properties
                .section(name)
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            if entries.is_empty() {
                return Err(CliError::Command(format!(
                    "unknown section: {} (available: {})",
                    name,
                    resolved.properties.section_names().join(", ")
                )));
            }
            entries
        }
        None => resolved
            .properties
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
    };

    let config_toml = toml::to_string_pretty(&to_toml(&properties))
        .unwrap_or_else(|e| format!("(serialization error: {})", e));

    Ok(ConfigReport {
        environment: resolved.environment,
        language: resolved.language,
        section,
        properties,
        sources: resolved.sources,
        config_toml,
    })
}

/// Group dotted keys into TOML tables (`Driver.type` -> `[Driver] type`).
fn to_toml(properties: &BTreeMap<String, String>) -> toml::Table {
    let mut root = toml::Table::new();
    for (key, value) in properties {
        let value = toml::Value::String(value.clone());
        match key.split_once('.') {
            // a plain key with the same name as the section keeps the dotted form
            Some((section, rest)) if root.get(section).is_none_or(toml::Value::is_table) => {
                if let toml::Value::Table(table) = root
                    .entry(section.to_owned())
                    .or_insert_with(|| toml::Value::Table(toml::Table::new()))
                {
                    table.insert(rest.to_owned(), value);
                }
            }
            _ => {
                root.insert(key.clone(), value);
            }
        }
    }
    root
}

/// Check every configuration source without running a suite.
///
/// Unlike a suite run, sources that would be skipped with a warning
/// (malformed environment or language files) count as errors here.
pub fn validate(project: &Project, params: &RuntimeParams) -> ConfigValidationReport {
    let layout = project.layout();
    let mut report = ConfigValidationReport {
        root: project.root().display().to_string(),
        environment: params.environment().to_owned(),
        language: params.language().to_owned(),
        valid: false,
        sources: Vec::new(),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    info!(path = %layout.logging_path().display(), "validating logging configuration");
    if let Err(e) = LoggingConfig::load(&layout.logging_path()) {
        report.errors.push(e.to_string());
    }

    match project.resolver().resolve(params) {
        Ok(resolved) => {
            for source in &resolved.sources {
                let path = source.path.display();
                match &source.status {
                    SourceStatus::Loaded { .. } => {}
                    SourceStatus::Missing => {
                        report.warnings.push(format!("{path}: not found"));
                    }
                    SourceStatus::Skipped { reason } => {
                        report.errors.push(format!("{path}: {reason}"));
                    }
                }
            }
            if let Err(e) = VisualSettings::from_store(&resolved.properties) {
                report.errors.push(e.to_string());
            }
            report.sources = resolved.sources;
        }
        Err(e) => report.errors.push(e.to_string()),
    }

    report.valid = report.errors.is_empty();
    report
}

/// Effective configuration report.
#[derive(Serialize)]
pub struct ConfigReport {
    pub environment: String,
    pub language: String,
    /// Section filter (None = all properties)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub properties: BTreeMap<String, String>,
    /// Sources considered, in load order
    pub sources: Vec<SourceReport>,
    /// Text rendering only
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        write!(w, "Configuration")?;
        if let Some(section) = &self.section {
            write!(w, " {}", format!("[{section}]").bold())?;
        }
        writeln!(
            w,
            " (environment: {}, language: {})",
            self.environment.bold(),
            self.language.bold()
        )?;
        for source in &self.sources {
            writeln!(w, "  {}", render_source(source))?;
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

fn render_source(source: &SourceReport) -> String {
    use colored::Colorize;

    let path = source.path.display();
    match &source.status {
        SourceStatus::Loaded { keys } => format!("{} {path} ({keys} keys)", "loaded ".green()),
        SourceStatus::Missing => format!("{} {path}", "missing".yellow()),
        SourceStatus::Skipped { reason } => format!("{} {path}: {reason}", "skipped".red()),
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub root: String,
    pub environment: String,
    pub language: String,
    pub valid: bool,
    pub sources: Vec<SourceReport>,
    /// Missing optional sources
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Config Validation: {} (environment: {}, language: {})",
            self.root.bold(),
            self.environment,
            self.language
        )?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
        }
        for warning in &self.warnings {
            writeln!(w, "  Warning: {}", warning.yellow())?;
        }
        for err in &self.errors {
            writeln!(w, "  Error: {}", err.red())?;
        }
        Ok(())
    }
}
