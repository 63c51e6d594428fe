use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decision::Approach;
use crate::error::ConfigError;

/// Top-level configuration for the staking agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakecastConfig {
    pub staking: StakingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl StakecastConfig {
    /// Reject settings that would make the agent misbehave. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.staking.validate()?;
        self.scheduler.validate()
    }
}

/// How much to stake and how to split it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StakingConfig {
    pub approach: Approach,
    /// Total stake committed per epoch, split across both legs.
    pub stake_budget: Decimal,
    /// A dominant model must exceed this confidence for its prediction to count.
    pub confidence_threshold: f64,
    /// Stake per leg when both legs are resent after a failed submission.
    #[serde(default = "default_resubmit_stake_floor")]
    pub resubmit_stake_floor: Decimal,
    /// Minimum native-token balance each identity needs to pay for gas.
    #[serde(default = "default_min_gas_balance")]
    pub min_gas_balance: Decimal,
}

impl StakingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "confidence_threshold",
                reason: format!("{} is outside [0, 1]", self.confidence_threshold),
            });
        }
        if self.stake_budget.is_sign_negative() {
            return Err(ConfigError::Invalid {
                field: "stake_budget",
                reason: format!("{} is negative", self.stake_budget),
            });
        }
        if self.resubmit_stake_floor <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "resubmit_stake_floor",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.min_gas_balance.is_sign_negative() {
            return Err(ConfigError::Invalid {
                field: "min_gas_balance",
                reason: format!("{} is negative", self.min_gas_balance),
            });
        }
        Ok(())
    }
}

/// Timing of the decision window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Start acting once this many seconds or fewer remain in the epoch.
    #[serde(default = "default_predict_threshold")]
    pub predict_threshold_s: u64,
    /// Stop acting once fewer than this many seconds remain.
    #[serde(default = "default_cutoff")]
    pub cutoff_s: u64,
    /// Sleep between polls when no new block has arrived.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop after this many ticks. 0 = run until cancelled.
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            predict_threshold_s: default_predict_threshold(),
            cutoff_s: default_cutoff(),
            poll_interval_ms: default_poll_interval_ms(),
            max_ticks: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cutoff_s > self.predict_threshold_s {
            return Err(ConfigError::Invalid {
                field: "cutoff_s",
                reason: format!(
                    "{} exceeds predict_threshold_s ({}), the window would be empty",
                    self.cutoff_s, self.predict_threshold_s
                ),
            });
        }
        Ok(())
    }
}

/// Where submission records are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LedgerConfig {
    /// SQLite file for the ledger. None keeps records in memory only.
    pub sqlite_path: Option<String>,
}

fn default_resubmit_stake_floor() -> Decimal {
    Decimal::new(1, 10)
}
fn default_min_gas_balance() -> Decimal {
    Decimal::new(1, 2)
}
fn default_predict_threshold() -> u64 {
    60
}
fn default_cutoff() -> u64 {
    5
}
fn default_poll_interval_ms() -> u64 {
    1000
}
