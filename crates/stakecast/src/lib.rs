//! stakecast - two-sided staking agent for epoch-based prediction markets
//!
//! Merges an up-model and a down-model into one decision, splits a stake
//! budget across both outcomes, and submits both legs before each epoch's
//! deadline.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use stakecast::models::{DirectionalSignal, StakecastConfig};
//! use stakecast::agent::{DirectionalModels, MarketInterface, SubmissionCoordinator};
//! use stakecast::strategy::{merge, allocate, calc_payout};
//! ```

pub use stakecast_agent as agent;
pub use stakecast_ledger as ledger;
pub use stakecast_models as models;
pub use stakecast_strategy as strategy;

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use stakecast_agent::{DirectionalModels, MarketInterface, SubmissionCoordinator};
use stakecast_ledger::{MemoryLedger, SqliteLedger, SubmissionLedger};
use stakecast_models::config::{LedgerConfig, StakecastConfig, StakingConfig};
use stakecast_models::decision::{Decision, DirectionalSignal, StakeSplit};
use stakecast_models::direction::PerDirection;
use stakecast_strategy::{ConfidenceMerger, StakeAllocator, StrategyError};
use tracing::info;

/// Read, parse and validate a TOML config file.
pub fn load_config(path: &str) -> Result<StakecastConfig, anyhow::Error> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {path}"))?;
    let config: StakecastConfig = toml::from_str(&raw).context("Failed to parse config")?;
    config.validate().context("Invalid config")?;
    Ok(config)
}

/// Open the configured ledger: SQLite when a path is set, in-memory otherwise.
pub fn build_ledger(config: &LedgerConfig) -> Result<Box<dyn SubmissionLedger>, anyhow::Error> {
    match &config.sqlite_path {
        Some(path) => {
            let ledger = SqliteLedger::open(path)
                .with_context(|| format!("Failed to open ledger: {path}"))?;
            info!(path = %path, "Using SQLite submission ledger");
            Ok(Box::new(ledger))
        }
        None => {
            info!("Using in-memory submission ledger");
            Ok(Box::new(MemoryLedger::new()))
        }
    }
}

/// Build a SubmissionCoordinator from configuration and the two identities'
/// market handles.
pub fn build_coordinator(
    config: &StakecastConfig,
    markets: PerDirection<Arc<dyn MarketInterface>>,
    models: DirectionalModels,
) -> Result<SubmissionCoordinator, anyhow::Error> {
    config.validate().context("Invalid config")?;
    let ledger = build_ledger(&config.ledger)?;
    let coordinator = SubmissionCoordinator::new(
        markets,
        models,
        ledger,
        config.staking.clone(),
        config.scheduler.clone(),
    )?;
    Ok(coordinator)
}

/// What the agent would stake for a signal, without touching a market.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DryRun {
    pub decision: Decision,
    pub stakes: StakeSplit,
}

pub fn decide(config: &StakingConfig, signal: &DirectionalSignal) -> Result<DryRun, StrategyError> {
    let merger = ConfidenceMerger::new(config.confidence_threshold)?;
    let allocator = StakeAllocator::new(config.stake_budget, config.approach)?;
    let decision = merger.merge(signal)?;
    let stakes = allocator.allocate(Some(&decision))?;
    Ok(DryRun { decision, stakes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stakecast_agent::test_support::{FixedClassifier, MockMarket, StaticFeatures};
    use stakecast_agent::TickOutcome;
    use stakecast_models::config::SchedulerConfig;
    use stakecast_models::decision::Approach;

    fn staking(approach: Approach) -> StakingConfig {
        StakingConfig {
            approach,
            stake_budget: dec!(10),
            confidence_threshold: 0.1,
            resubmit_stake_floor: dec!(0.0000000001),
            min_gas_balance: dec!(0.01),
        }
    }

    #[test]
    fn decide_confidence_weighted() {
        let signal = DirectionalSignal {
            prob_up: 0.4,
            prob_down: 0.75,
        };
        let dry = decide(&staking(Approach::ConfidenceWeighted), &signal).unwrap();
        assert!(dry.decision.pred_down);
        assert_eq!(dry.stakes.stake_up, dec!(2.5));
        assert_eq!(dry.stakes.stake_down, dec!(7.5));

        let json = serde_json::to_value(dry).unwrap();
        assert_eq!(json["decision"]["pred_down"], true);
        assert!(json["stakes"]["stake_up"].is_string());
    }

    #[test]
    fn decide_rejects_bad_signal() {
        let signal = DirectionalSignal {
            prob_up: -0.2,
            prob_down: 0.5,
        };
        assert!(decide(&staking(Approach::EqualSplit), &signal).is_err());
    }

    #[test]
    fn load_config_parses_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        std::fs::write(
            &good,
            r#"
[staking]
approach = "equal_split"
stake_budget = "3"
confidence_threshold = 0.2

[ledger]
sqlite_path = "ledger.db"
"#,
        )
        .unwrap();
        let config = load_config(good.to_str().unwrap()).unwrap();
        assert_eq!(config.staking.approach, Approach::EqualSplit);
        assert_eq!(config.scheduler, SchedulerConfig::default());

        let bad = dir.path().join("bad.toml");
        std::fs::write(
            &bad,
            r#"
[staking]
approach = "equal_split"
stake_budget = "3"
confidence_threshold = 1.5
"#,
        )
        .unwrap();
        assert!(load_config(bad.to_str().unwrap()).is_err());
        assert!(load_config("does/not/exist.toml").is_err());
    }

    #[test]
    fn build_ledger_picks_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let mut ledger = build_ledger(&LedgerConfig {
            sqlite_path: Some(path.to_str().unwrap().to_string()),
        })
        .unwrap();
        ledger.reserve(1, 600).unwrap();
        assert!(path.exists());

        let ledger = build_ledger(&LedgerConfig::default()).unwrap();
        assert!(ledger.epochs().unwrap().is_empty());
    }

    #[tokio::test]
    async fn built_coordinator_submits() {
        let config = StakecastConfig {
            staking: staking(Approach::ConfidenceWeighted),
            scheduler: SchedulerConfig {
                poll_interval_ms: 0,
                ..SchedulerConfig::default()
            },
            ledger: LedgerConfig::default(),
        };
        let up = Arc::new(MockMarket::new("up", 300));
        let down = Arc::new(MockMarket::new("down", 300));
        up.push_block(1, 3250).await;
        let markets = PerDirection::new(
            up.clone() as Arc<dyn MarketInterface>,
            down.clone() as Arc<dyn MarketInterface>,
        );
        let models = DirectionalModels::new(
            Arc::new(FixedClassifier(0.75)),
            Arc::new(FixedClassifier(0.2)),
            Arc::new(StaticFeatures(vec![0.0])),
        );

        let mut coordinator = build_coordinator(&config, markets, models).unwrap();
        assert!(matches!(
            coordinator.tick().await.unwrap(),
            TickOutcome::Submitted(_)
        ));
        assert_eq!(down.submissions().await.len(), 1);
    }
}
