use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stakecast_sim::config::SimConfig;
use stakecast_sim::engine::SimEngine;
use stakecast_sim::history::load_history;
use stakecast_sim::multisim::MultiSimEngine;

#[derive(Parser, Debug)]
#[command(
    name = "stakecast-sim",
    about = "Replay recorded model outputs through the staking strategy and report profit and accuracy"
)]
struct Cli {
    /// Path to simulation configuration file
    #[arg(short, long, default_value = "config/stakecast-sim.toml")]
    config: String,

    /// Override the history file named in the config
    #[arg(long)]
    history: Option<String>,

    /// Replay only the base configuration even if a [multisim] table is present
    #[arg(long)]
    single: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let mut config: SimConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse sim config")?;
    if let Some(history) = cli.history {
        config.sim.history_path = history;
    }

    let history = load_history(&config.sim.history_path)
        .with_context(|| format!("Failed to load history: {}", config.sim.history_path))?;

    let output = if config.multisim.is_some() && !cli.single {
        let engine = MultiSimEngine::new(config).context("Failed to build multisim")?;
        let rows = engine
            .run(&history)
            .map_err(|e| anyhow::anyhow!("Multisim failed: {e}"))?;
        to_json(&rows, cli.pretty)?
    } else {
        let engine = SimEngine::new(config).context("Failed to build simulation")?;
        let summary = engine
            .run(&history)
            .map_err(|e| anyhow::anyhow!("Simulation failed: {e}"))?;
        to_json(&summary, cli.pretty)?
    };
    println!("{output}");

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
