mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{normalize, replay, NormalizeArgs, ReplayArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Arch CLI - normalize rich-text markup and replay editing sessions
#[derive(Parser, Debug)]
#[command(name = "arch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to arch.config.json in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log what the editor does (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print markup the way the editor stores it
    Normalize(NormalizeArgs),

    /// Apply a JSON list of edit intents to a markup file
    Replay(ReplayArgs),
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = config::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Normalize(args) => normalize(args, &config),
        Command::Replay(args) => replay(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
