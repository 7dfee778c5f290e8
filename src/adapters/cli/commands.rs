//! CLI Command Handlers
//!
//! Implementation of all CLI commands for dealer-edge.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::adapters::snapshot_file::JsonFileSource;
use crate::application::{aggregate, analyze};
use crate::config::{default_config_toml, load_or_default, Config};
use crate::ports::SnapshotSource;

/// dealer-edge - Options dealer hedging analytics
#[derive(Parser, Debug)]
#[command(
    name = "dealer-edge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dealer hedging analytics over an options chain snapshot",
    long_about = "dealer-edge reads an options chain snapshot with price history and reports \
                  dealer gamma exposure, hedging regimes, volatility premium context, a \
                  directional thesis and a straddle/strangle score."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full analysis and print the report
    Analyze(AnalyzeCmd),

    /// Pool GEX across the snapshot's expirations
    Aggregate(AggregateCmd),

    /// Print the default configuration as TOML
    Defaults(DefaultsCmd),
}

/// Run the full analysis
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Snapshot JSON file
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: String,

    /// Path to configuration file (falls back to DEALER_EDGE_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Pretty-print the JSON report
    #[arg(short, long)]
    pub pretty: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Aggregate GEX across expirations
#[derive(Parser, Debug)]
pub struct AggregateCmd {
    /// Snapshot JSON file
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: String,

    /// Path to configuration file (falls back to DEALER_EDGE_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pub pretty: bool,
}

/// Print default configuration
#[derive(Parser, Debug)]
pub struct DefaultsCmd {}

impl CliApp {
    /// Load the configuration the command asks for. `defaults` never reads
    /// a file so it works even when the configured file is broken.
    pub fn load_config(&self) -> Result<Config> {
        let path = match &self.command {
            Command::Analyze(cmd) => cmd.config.as_deref(),
            Command::Aggregate(cmd) => cmd.config.as_deref(),
            Command::Defaults(_) => return Ok(Config::default()),
        };
        load_or_default(path).context("Failed to load configuration")
    }
}

/// Execute the CLI command
pub fn execute(app: CliApp, config: Config) -> Result<()> {
    match app.command {
        Command::Analyze(cmd) => analyze_command(cmd, &config),
        Command::Aggregate(cmd) => aggregate_command(cmd, &config),
        Command::Defaults(_) => defaults_command(),
    }
}

/// Handle analyze command
fn analyze_command(cmd: AnalyzeCmd, config: &Config) -> Result<()> {
    tracing::info!("Analyzing snapshot {}", cmd.snapshot);

    let snapshot = JsonFileSource::new()
        .load(&cmd.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", cmd.snapshot))?;
    let report = analyze(&snapshot, &config.analysis);

    let pretty = cmd.pretty || config.output.pretty;
    let output = cmd.output.or_else(|| config.output.resolved_path());
    emit(&report, pretty, output.as_deref())
}

/// Handle aggregate command
fn aggregate_command(cmd: AggregateCmd, config: &Config) -> Result<()> {
    let snapshot = JsonFileSource::new()
        .load(&cmd.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", cmd.snapshot))?;
    let pooled = aggregate(&snapshot, &config.analysis);
    tracing::info!(
        "Pooled {} expirations: {:?}, flip {:?}",
        pooled.n_expirations,
        pooled.regime,
        pooled.flip_point
    );

    emit(&pooled, cmd.pretty || config.output.pretty, None)
}

/// Handle defaults command
fn defaults_command() -> Result<()> {
    let rendered = default_config_toml().context("Failed to render default configuration")?;
    print!("{}", rendered);
    Ok(())
}

/// Serialize to JSON and write to `path`, or stdout when none
fn emit<T: Serialize>(value: &T, pretty: bool, path: Option<&Path>) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;

    match path {
        Some(path) => {
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
