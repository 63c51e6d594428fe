use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakecast_models::config::StakingConfig;
use stakecast_models::decision::Approach;
use stakecast_models::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    pub staking: StakingConfig,
    pub sim: SimSettings,
    /// Present when the run should sweep several strategies instead of one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisim: Option<SweepSettings>,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.staking.validate()?;
        self.sim.validate()
    }
}

/// Candidate values for each swept parameter.
///
/// Every combination is replayed once. An empty list keeps the base value
/// from `[staking]` / `[sim]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepSettings {
    #[serde(default)]
    pub approaches: Vec<Approach>,
    #[serde(default)]
    pub confidence_thresholds: Vec<f64>,
    #[serde(default)]
    pub stake_budgets: Vec<Decimal>,
    #[serde(default)]
    pub others_accuracies: Vec<f64>,
}

/// The market the replayed strategy competes in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimSettings {
    /// JSON Lines file of `EpochObservation`s.
    pub history_path: String,
    /// Aggregate stake of every other participant, per epoch.
    pub others_stake: f64,
    /// Fraction of the others' stake placed on the correct side.
    pub others_accuracy: f64,
    /// External revenue added to each epoch's pool.
    pub revenue: f64,
    /// Log a progress line every this many epochs. 0 disables.
    #[serde(default = "default_log_every")]
    pub log_every: usize,
    /// Replay at most this many epochs. 0 = all.
    #[serde(default)]
    pub max_epochs: usize,
}

impl SimSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.others_stake.is_finite() || self.others_stake < 0.0 {
            return Err(ConfigError::Invalid {
                field: "others_stake",
                reason: format!("{} is not a finite non-negative amount", self.others_stake),
            });
        }
        if !(0.0..=1.0).contains(&self.others_accuracy) {
            return Err(ConfigError::Invalid {
                field: "others_accuracy",
                reason: format!("{} is outside [0, 1]", self.others_accuracy),
            });
        }
        if !self.revenue.is_finite() || self.revenue < 0.0 {
            return Err(ConfigError::Invalid {
                field: "revenue",
                reason: format!("{} is not a finite non-negative amount", self.revenue),
            });
        }
        Ok(())
    }
}

fn default_log_every() -> usize {
    10
}
