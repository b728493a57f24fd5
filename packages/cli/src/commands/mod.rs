pub mod format;
pub mod query;
pub mod run;

pub use format::{format, FormatArgs};
pub use query::{query, QueryArgs};
pub use run::{run, RunArgs};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use scribe_editor::{Editor, EditorConfig, MemorySelection, SystemClock};
use std::path::Path;

/// A `start..end` character range given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectRange {
    pub start: usize,
    pub end: usize,
}

pub fn parse_select(value: &str) -> Result<SelectRange, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected <start>..<end>, got '{}'", value))?;
    let start = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start offset '{}'", start))?;
    let end = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end offset '{}'", end))?;
    Ok(SelectRange { start, end })
}

/// Load `file` into a headless editor
pub fn open_editor(file: &Path, config: &EditorConfig) -> Result<Editor> {
    let markup = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let mut editor = Editor::new(config.clone(), MemorySelection::new(), SystemClock);
    editor
        .load(&markup)
        .with_context(|| format!("Cannot parse {}", file.display()))?;
    Ok(editor)
}

pub fn select(editor: &mut Editor, start: usize, end: usize) -> Result<()> {
    if !editor.select(start, end) {
        bail!(
            "Selection {}..{} is outside the document ({} characters)",
            start,
            end,
            editor.text().chars().count()
        );
    }
    Ok(())
}

/// Print the markup or write it to `output`
pub fn write_output(markup: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, markup).with_context(|| format!("Cannot write {}", path.display()))?;
            eprintln!("  {} wrote {}", "✓".green(), path.display());
        }
        None => println!("{}", markup),
    }
    Ok(())
}
