//! `stepwise init` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use stepwise_harness::Project;
use stepwise_harness::project::ScaffoldEntry;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `init` command.
pub fn execute(project: &Project, writer: &OutputWriter) -> Result<(), CliError> {
    info!(root = %project.root().display(), "scaffolding project");
    let entries = project.scaffold()?;
    writer.render(&InitReport {
        root: project.root().display().to_string(),
        entries,
    })
}

#[derive(Serialize)]
pub struct InitReport {
    pub root: String,
    pub entries: Vec<ScaffoldEntry>,
}

impl InitReport {
    pub fn created(&self) -> usize {
        self.entries.iter().filter(|e| e.created).count()
    }
}

impl Render for InitReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Project: {}", self.root.bold())?;
        for entry in &self.entries {
            let label = if entry.created {
                "created".green()
            } else {
                "exists ".yellow()
            };
            writeln!(w, "  {} {}", label, entry.path.display())?;
        }
        writeln!(w, "{} created, {} kept", self.created(), self.entries.len() - self.created())?;
        Ok(())
    }
}
