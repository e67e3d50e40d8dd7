//! `stepwise` command-line entry point.

mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use stepwise_core::config::RuntimeParams;
use stepwise_harness::Project;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

/// Diagnostics go to stderr so command output on stdout stays parseable.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    // ignore a second initialization
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let project = Project::new(cli.project.clone());
    let params = RuntimeParams::from_userdata(&cli.userdata());
    let writer = OutputWriter::new(cli.output);

    tracing::debug!(
        root = %project.root().display(),
        environment = %params.environment(),
        language = %params.language(),
        "stepwise starting"
    );

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &project, &params, &writer),
        Commands::Lang(args) => commands::lang::execute(args, &project, &params, &writer),
        Commands::Init => commands::init::execute(&project, &writer),
    }
}
