use super::{open_editor, parse_select, select, SelectRange};
use anyhow::Result;
use clap::Args;
use scribe_editor::EditorConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Markup file to inspect
    pub file: PathBuf,

    /// Character range to inspect, as <start>..<end>
    #[arg(short, long, value_parser = parse_select)]
    pub select: SelectRange,
}

/// Print the active formats as JSON
pub fn query(args: QueryArgs, config: &EditorConfig) -> Result<()> {
    let mut editor = open_editor(&args.file, config)?;
    select(&mut editor, args.select.start, args.select.end)?;

    let state = editor.active_formats();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
