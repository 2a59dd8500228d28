use anyhow::{Context, Result};
use arch_editor::{EditIntent, EditorContext, SelectionReport};
use arch_tree::ArchConfig;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Markup file to start from
    pub markup: PathBuf,

    /// JSON array of edit intents
    pub intents: PathBuf,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentOutcome {
    pub intent: String,
    pub handled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub markup: String,
    pub selection: SelectionReport,
    pub outcomes: Vec<IntentOutcome>,
}

pub fn replay(args: ReplayArgs, config: &ArchConfig) -> Result<()> {
    let source = fs::read_to_string(&args.markup)
        .with_context(|| format!("Cannot read {}", args.markup.display()))?;
    let script = fs::read_to_string(&args.intents)
        .with_context(|| format!("Cannot read {}", args.intents.display()))?;
    let intents: Vec<EditIntent> = serde_json::from_str(&script)
        .with_context(|| format!("Invalid intent list in {}", args.intents.display()))?;

    let report = replay_session(config, &source, intents)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        if outcome.handled {
            println!("  {} {}", "✓".green(), outcome.intent);
        } else {
            println!("  {} {} {}", "–".yellow(), outcome.intent, "(not handled)".dimmed());
        }
    }
    println!();
    println!("{}", report.markup);
    Ok(())
}

/// Runs `intents` in order against a session opened on `source`.
pub fn replay_session(config: &ArchConfig, source: &str, intents: Vec<EditIntent>) -> Result<ReplayReport> {
    let mut context = EditorContext::from_markup(config.clone(), source)?;

    let mut outcomes = Vec::with_capacity(intents.len());
    for intent in intents {
        let name = intent.name().to_string();
        let handled = context.apply(intent);
        outcomes.push(IntentOutcome { intent: name, handled });
    }
    info!(
        applied = outcomes.len(),
        handled = outcomes.iter().filter(|o| o.handled).count(),
        "Replay finished"
    );

    Ok(ReplayReport {
        markup: context.markup(false),
        selection: context.selection_report(),
        outcomes,
    })
}
