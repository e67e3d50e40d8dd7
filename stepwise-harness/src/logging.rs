//! Logging initialization for stepwise suites.
//!
//! Configures `tracing-subscriber` from the `[logging]` section of
//! `logging.conf`. Events go to stderr, to the suite log file in the
//! output directory, or both. `RUST_LOG` overrides the configured level.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use stepwise_core::config::LoggingConfig;

use crate::project::Project;

/// A formatting layer erased to a common type so layers can be chosen at runtime.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Build the formatting layers described by `config`.
///
/// `log_file` is the suite log path; it is only opened when `config.file` is set.
pub fn build_layers(config: &LoggingConfig, log_file: &Path) -> Result<Vec<BoxedLayer>> {
    config.validate()?;
    let mut layers = Vec::new();

    if config.console {
        layers.push(fmt_layer(&config.format, std::io::stderr, true)?);
    }

    if config.file {
        if let Some(parent) = log_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = open_log_file(log_file)?;
        layers.push(fmt_layer(&config.format, Mutex::new(file), false)?);
    }

    Ok(layers)
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

fn fmt_layer<W>(format: &str, writer: W, ansi: bool) -> Result<BoxedLayer>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    let boxed = match format {
        "json" => layer.json().boxed(),
        "pretty" => layer.pretty().boxed(),
        "compact" => layer.compact().boxed(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json', 'pretty' or 'compact'",
                other
            ));
        }
    };
    Ok(boxed)
}

/// The level filter: `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Initialize the global tracing subscriber.
///
/// Must be called at most once per process, before the suite starts.
pub fn init_tracing(config: &LoggingConfig, log_file: &Path) -> Result<()> {
    let layers = build_layers(config, log_file)?;
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(config))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;
    Ok(())
}

/// Load `logging.conf` from the project and initialize tracing with it.
///
/// Returns the configuration that was applied.
pub fn init_project_logging(project: &Project) -> Result<LoggingConfig> {
    let layout = project.layout();
    let config = LoggingConfig::load(&layout.logging_path())
        .with_context(|| format!("failed to load {}", layout.logging_path().display()))?;
    init_tracing(&config, &layout.output_log_path())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config(format: &str, file: bool, console: bool) -> LoggingConfig {
        LoggingConfig {
            level: "info".to_owned(),
            format: format.to_owned(),
            file,
            console,
        }
    }

    #[test]
    fn console_only_builds_one_layer() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("_output/acceptance_int.log");

        let layers = build_layers(&config("compact", false, true), &log).unwrap();

        assert_eq!(layers.len(), 1);
        assert!(!log.exists(), "file is not created when file logging is off");
    }

    #[test]
    fn file_and_console_build_two_layers() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("_output/acceptance_int.log");

        let layers = build_layers(&config("json", true, true), &log).unwrap();

        assert_eq!(layers.len(), 2);
        assert!(log.exists());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_layers(&config("xml", false, true), &dir.path().join("x.log"));
        assert!(result.is_err());
    }

    #[test]
    fn file_layer_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("_output/acceptance_int.log");
        let layers = build_layers(&config("json", true, false), &log).unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(scenario = "login", "The scenario 'login' has passed");
        });

        let content = fs::read_to_string(&log).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["message"], "The scenario 'login' has passed");
        assert_eq!(line["fields"]["scenario"], "login");
    }

    #[test]
    fn file_logging_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("acceptance_int.log");
        fs::write(&log, "previous run\n").unwrap();

        let layers = build_layers(&config("compact", true, false), &log).unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);
        tracing::subscriber::with_default(subscriber, || tracing::warn!("next run"));

        let content = fs::read_to_string(&log).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.contains("next run"));
    }

    #[test]
    #[serial]
    fn rust_log_overrides_configured_level() {
        // SAFETY: environment variables are only touched from serial tests.
        unsafe { std::env::set_var("RUST_LOG", "debug") };
        let filter = env_filter(&config("pretty", false, true));
        unsafe { std::env::remove_var("RUST_LOG") };

        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial]
    fn configured_level_applies_without_rust_log() {
        unsafe { std::env::remove_var("RUST_LOG") };
        let filter = env_filter(&config("pretty", false, true));
        assert_eq!(filter.to_string(), "info");
    }
}
