use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Outputs of the two directional classifiers for one decision tick.
///
/// `prob_up` is the up-model's probability that the up threshold is breached,
/// `prob_down` is the down-model's probability that the down threshold is
/// breached. Both must lie in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DirectionalSignal {
    pub prob_up: f64,
    pub prob_down: f64,
}

/// The merged, trust-gated view of a [`DirectionalSignal`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// Both models claim (or both doubt) their own event.
    pub conflict: bool,
    /// Up confidence scaled to [0, 1]. Zero unless the up model dominates.
    pub conf_up: f64,
    /// Down confidence scaled to [0, 1]. Zero unless the down model dominates.
    pub conf_down: f64,
    pub pred_up: bool,
    pub pred_down: bool,
    /// Single probability-of-up estimate; 0.5 when conflicted.
    pub prob_up_merged: f64,
    pub trusted: bool,
}

/// Which stake-splitting policy the agent runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    /// Half the budget on each side, regardless of the models.
    EqualSplit,
    /// Budget split in proportion to the merged probability of up.
    #[default]
    ConfidenceWeighted,
}

impl std::fmt::Display for Approach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Approach::EqualSplit => write!(f, "equal_split"),
            Approach::ConfidenceWeighted => write!(f, "confidence_weighted"),
        }
    }
}

/// Stake committed to each side for one epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StakeSplit {
    pub stake_up: Decimal,
    pub stake_down: Decimal,
}

impl StakeSplit {
    pub fn total(&self) -> Decimal {
        self.stake_up + self.stake_down
    }

    pub fn is_zero(&self) -> bool {
        self.stake_up.is_zero() && self.stake_down.is_zero()
    }

    pub fn stake(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Up => self.stake_up,
            Direction::Down => self.stake_down,
        }
    }

    /// Both legs at the same amount. Used for the fail-safe resubmission.
    pub fn uniform(amount: Decimal) -> Self {
        Self {
            stake_up: amount,
            stake_down: amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn approach_serialization() {
        assert_eq!(
            serde_json::to_string(&Approach::EqualSplit).unwrap(),
            "\"equal_split\""
        );
        assert_eq!(
            serde_json::to_string(&Approach::ConfidenceWeighted).unwrap(),
            "\"confidence_weighted\""
        );
        assert!(serde_json::from_str::<Approach>("\"kelly\"").is_err());
    }

    #[test]
    fn stake_split_totals() {
        let split = StakeSplit {
            stake_up: dec!(6.5),
            stake_down: dec!(3.5),
        };
        assert_eq!(split.total(), dec!(10));
        assert!(!split.is_zero());
        assert!(StakeSplit::default().is_zero());
        assert_eq!(StakeSplit::uniform(dec!(0.1)).total(), dec!(0.2));
        assert_eq!(split.stake(Direction::Up), dec!(6.5));
        assert_eq!(split.stake(Direction::Down), dec!(3.5));
    }

    #[test]
    fn signal_from_json() {
        let signal: DirectionalSignal =
            serde_json::from_str(r#"{"prob_up": 0.62, "prob_down": 0.31}"#).unwrap();
        assert_eq!(signal.prob_up, 0.62);
        assert_eq!(signal.prob_down, 0.31);
    }
}
