use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rewind_config::AppConfig;
use rewind_core::{Command, Document};
use rewind_mod_history::HistoryConfig;

/// Replays an edit script against an undoable node graph.
#[derive(Parser, Debug)]
#[command(name = "rewind", version, about)]
struct Cli {
    /// JSON file holding an array of edit commands.
    script: PathBuf,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final state on a single line.
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(config = %config_path.display(), "Starting rewind");

    let commands = Command::load_script(&cli.script)?;
    tracing::info!(commands = commands.len(), "Loaded script");

    let mut document = Document::new(HistoryConfig::with_max_undo_depth(config.max_undo_depth));
    document
        .run_script(&commands)
        .with_context(|| format!("Failed to run {}", cli.script.display()))?;

    let view = document.view();
    let output = if cli.compact || !config.pretty_output {
        serde_json::to_string(&view)
    } else {
        serde_json::to_string_pretty(&view)
    }
    .context("Failed to serialize document")?;
    println!("{output}");

    Ok(())
}
