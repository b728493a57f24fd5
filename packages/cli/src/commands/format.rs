use super::{open_editor, parse_select, select, write_output, SelectRange};
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use scribe_editor::{Command, EditorConfig, Outcome};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Markup file to edit
    pub file: PathBuf,

    /// Character range to act on, as <start>..<end>
    #[arg(short, long, value_parser = parse_select)]
    pub select: SelectRange,

    /// Command name (bold, align-center, link, table, ...)
    #[arg(short, long)]
    pub action: String,

    /// Command value (address, size, level, RxC)
    #[arg(long)]
    pub value: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn format(args: FormatArgs, config: &EditorConfig) -> Result<()> {
    let mut editor = open_editor(&args.file, config)?;
    select(&mut editor, args.select.start, args.select.end)?;

    let command = Command {
        action: args.action.clone(),
        value: args.value.clone(),
    };
    let outcome = editor.execute(&command)?;
    if outcome == Outcome::Ignored {
        bail!("Unknown action or missing value: {}", args.action);
    }
    editor.flush();

    eprintln!("  {} {} → {:?}", "✓".green(), args.action.bold(), outcome);
    write_output(&editor.html(), args.output.as_deref())
}
