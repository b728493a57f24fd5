use super::{open_editor, select, write_output};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use scribe_editor::{Command, EditorConfig, Outcome};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Markup file to edit
    pub file: PathBuf,

    /// JSON array of steps: { "select": [start, end], "action": "...", "value": "..." }
    #[arg(long)]
    pub script: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One scripted command
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub select: [usize; 2],
    pub action: String,
    #[serde(default)]
    pub value: Option<String>,
}

pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read script {}", path.display()))?;
    parse_script(&content).with_context(|| format!("Invalid script {}", path.display()))
}

fn parse_script(content: &str) -> serde_json::Result<Vec<Step>> {
    serde_json::from_str(content)
}

pub fn run(args: RunArgs, config: &EditorConfig) -> Result<()> {
    let steps = load_script(&args.script)?;
    let mut editor = open_editor(&args.file, config)?;

    for (index, step) in steps.iter().enumerate() {
        let [start, end] = step.select;
        select(&mut editor, start, end).with_context(|| format!("Step {}", index + 1))?;

        let command = Command {
            action: step.action.clone(),
            value: step.value.clone(),
        };
        let outcome = editor
            .execute(&command)
            .with_context(|| format!("Step {} ({})", index + 1, step.action))?;

        match outcome {
            Outcome::Ignored => eprintln!(
                "  {} step {}: {} ignored",
                "⚠".yellow(),
                index + 1,
                step.action
            ),
            outcome => eprintln!(
                "  {} step {}: {} → {:?}",
                "✓".green(),
                index + 1,
                step.action,
                outcome
            ),
        }
    }
    editor.flush();

    write_output(&editor.html(), args.output.as_deref())
}
