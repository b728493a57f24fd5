mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{format, query, run, FormatArgs, QueryArgs, RunArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scribe CLI - apply rich-text formatting commands to markup files
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./scribe.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply one command to a selection
    Format(FormatArgs),

    /// Apply a JSON script of commands in order
    Run(RunArgs),

    /// Print the formats active over a selection
    Query(QueryArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load(&cwd, cli.config.as_deref())?;

    match cli.command {
        Command::Format(args) => format(args, &config),
        Command::Run(args) => run(args, &config),
        Command::Query(args) => query(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = execute(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
