use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stakecast_models::decision::DirectionalSignal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stakecast", about = "Two-sided prediction market staking agent")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/stakecast.toml")]
    config: String,

    /// Pretty-print the output JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a DirectionalSignal and show the stakes the configured approach would place
    Decide {
        /// Read DirectionalSignal JSON from a file instead of stdin
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Profit for one resolved epoch under pro-rata settlement
    Payout {
        #[arg(long)]
        others_stake: f64,
        #[arg(long)]
        others_accuracy: f64,
        #[arg(long)]
        stake_up: f64,
        #[arg(long)]
        stake_down: f64,
        #[arg(long)]
        revenue: f64,
        /// Whether the epoch closed up
        #[arg(long, action = clap::ArgAction::Set)]
        true_up_close: bool,
    },
}

#[derive(Serialize)]
struct PayoutOutput {
    profit: f64,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Decide { input } => {
            let config = stakecast::load_config(&cli.config)?;

            let signal_json = if let Some(input_path) = &input {
                std::fs::read_to_string(input_path)
                    .with_context(|| format!("Failed to read input: {input_path}"))?
            } else {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read from stdin")?;
                buf
            };
            let signal: DirectionalSignal = serde_json::from_str(&signal_json)
                .context("Failed to parse DirectionalSignal JSON")?;

            let dry_run = stakecast::decide(&config.staking, &signal)
                .map_err(|e| anyhow::anyhow!("Decision failed: {e}"))?;
            print_json(&dry_run, cli.pretty)
        }
        Command::Payout {
            others_stake,
            others_accuracy,
            stake_up,
            stake_down,
            revenue,
            true_up_close,
        } => {
            let profit = stakecast_strategy::calc_payout(
                others_stake,
                others_accuracy,
                stake_up,
                stake_down,
                revenue,
                true_up_close,
            )
            .map_err(|e| anyhow::anyhow!("Payout failed: {e}"))?;
            print_json(&PayoutOutput { profit }, cli.pretty)
        }
    }
}
