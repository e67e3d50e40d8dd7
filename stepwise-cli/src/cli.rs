//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stepwise -- configuration and lifecycle tooling for acceptance test suites.
///
/// Use `stepwise <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "stepwise", version, about, long_about = None)]
pub struct Cli {
    /// Project root containing `settings/` and `_output/`.
    #[arg(short, long, default_value = ".", global = true)]
    pub project: PathBuf,

    /// Runtime parameter, e.g. `-D environment=PRE -D language=EN`.
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_define, global = true)]
    pub defines: Vec<(String, String)>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The `-D` definitions as userdata (later definitions win).
    pub fn userdata(&self) -> BTreeMap<String, String> {
        self.defines.iter().cloned().collect()
    }
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and validate the resolved configuration.
    Config(ConfigArgs),

    /// Inspect language overlays.
    Lang(LangArgs),

    /// Create the project directory structure with template files.
    Init,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate every configuration source and report errors.
    Validate,
    /// Show the effective configuration (framework + environment overrides).
    Show {
        /// Show only one section (e.g. Driver, VisualTests).
        #[arg(long)]
        section: Option<String>,
    },
}

// ---- lang ----

#[derive(Args, Debug)]
pub struct LangArgs {
    #[command(subcommand)]
    pub action: LangAction,
}

#[derive(Subcommand, Debug)]
pub enum LangAction {
    /// List language items for the selected language.
    List,
    /// Show the texts of one language item.
    Show {
        /// Item name (the part after `<lang>_` in the file name).
        item: String,
    },
}
