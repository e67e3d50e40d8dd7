//! `stepwise lang` command handler

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use stepwise_core::config::{ResolvedConfig, RuntimeParams};
use stepwise_harness::Project;

use crate::cli::{LangAction, LangArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `lang` command.
pub fn execute(
    args: LangArgs,
    project: &Project,
    params: &RuntimeParams,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let resolved = project.resolver().resolve(params)?;
    match args.action {
        LangAction::List => writer.render(&list(&resolved)),
        LangAction::Show { item } => writer.render(&show(&resolved, &item)?),
    }
}

pub fn list(resolved: &ResolvedConfig) -> LangListReport {
    let items = resolved
        .languages
        .item_names()
        .map(|name| LangItemSummary {
            item: name.to_owned(),
            keys: resolved.languages.item(name).map_or(0, |store| store.len()),
        })
        .collect();
    LangListReport {
        language: resolved.language.clone(),
        items,
    }
}

/// # Errors
///
/// Returns `CliError::Command` when the item has no file for the selected language.
pub fn show(resolved: &ResolvedConfig, item: &str) -> Result<LangShowReport, CliError> {
    let store = resolved.languages.item(item).ok_or_else(|| {
        CliError::Command(format!(
            "unknown language item '{}' for language '{}'",
            item, resolved.language
        ))
    })?;
    Ok(LangShowReport {
        language: resolved.language.clone(),
        item: item.to_owned(),
        texts: store
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
    })
}

#[derive(Serialize)]
pub struct LangItemSummary {
    pub item: String,
    pub keys: usize,
}

#[derive(Serialize)]
pub struct LangListReport {
    pub language: String,
    pub items: Vec<LangItemSummary>,
}

impl Render for LangListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Language items ({}):", self.language.bold())?;
        if self.items.is_empty() {
            writeln!(w, "  (none)")?;
        }
        for item in &self.items {
            writeln!(w, "  {:<24} {} keys", item.item, item.keys)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct LangShowReport {
    pub language: String,
    pub item: String,
    pub texts: BTreeMap<String, String>,
}

impl Render for LangShowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{} ({})", self.item.bold(), self.language)?;
        for (key, text) in &self.texts {
            writeln!(w, "  {key} = {text}")?;
        }
        Ok(())
    }
}
