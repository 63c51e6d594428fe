use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decision::StakeSplit;
use crate::direction::{Direction, PerDirection};

/// Where a reserved epoch sits in the submission lifecycle:
/// `Submitting -> Submitted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EpochState {
    Submitting,
    Submitted,
}

impl EpochState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpochState::Submitting => "submitting",
            EpochState::Submitted => "submitted",
        }
    }
}

impl std::str::FromStr for EpochState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitting" => Ok(EpochState::Submitting),
            "submitted" => Ok(EpochState::Submitted),
            other => Err(format!("unknown epoch state: {other}")),
        }
    }
}

/// Result of submitting one leg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegOutcome {
    Confirmed { tx_hash: Option<String> },
    Failed { reason: String },
}

impl LegOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, LegOutcome::Confirmed { .. })
    }
}

/// One submission attempt: the stake sent on each leg and how each leg ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegAttempt {
    pub stakes: StakeSplit,
    pub outcomes: PerDirection<LegOutcome>,
}

impl LegAttempt {
    pub fn all_confirmed(&self) -> bool {
        Direction::ALL
            .iter()
            .all(|d| self.outcomes.get(*d).is_confirmed())
    }
}

/// The single record kept for an epoch once the agent commits to acting on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub epoch: u64,
    /// Slot timestamp the prediction targets (two epochs ahead).
    pub target_slot: u64,
    pub first_attempt: LegAttempt,
    /// Present when a leg of the first attempt failed and both legs were
    /// resent at the stake floor.
    pub resubmission: Option<LegAttempt>,
    pub state: EpochState,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRecord {
    /// The attempt whose outcome stands for this epoch.
    pub fn final_attempt(&self) -> &LegAttempt {
        self.resubmission.as_ref().unwrap_or(&self.first_attempt)
    }

    pub fn succeeded(&self) -> bool {
        self.final_attempt().all_confirmed()
    }

    /// Total stake actually put at risk by the final attempt.
    pub fn committed_stake(&self) -> Decimal {
        self.final_attempt().stakes.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn confirmed(hash: &str) -> LegOutcome {
        LegOutcome::Confirmed {
            tx_hash: Some(hash.to_string()),
        }
    }

    fn sample_record(resubmitted: bool) -> SubmissionRecord {
        let first = LegAttempt {
            stakes: StakeSplit {
                stake_up: dec!(6),
                stake_down: dec!(4),
            },
            outcomes: PerDirection::new(
                confirmed("0xaa"),
                LegOutcome::Failed {
                    reason: "status=0".to_string(),
                },
            ),
        };
        let resubmission = resubmitted.then(|| LegAttempt {
            stakes: StakeSplit::uniform(dec!(0.0000000001)),
            outcomes: PerDirection::new(confirmed("0xbb"), confirmed("0xcc")),
        });
        SubmissionRecord {
            epoch: 5_640_000,
            target_slot: 1_692_000_600,
            first_attempt: first,
            resubmission,
            state: EpochState::Submitted,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn roundtrip_submission_record() {
        let record = sample_record(true);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: SubmissionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn final_attempt_prefers_resubmission() {
        let record = sample_record(true);
        assert!(record.succeeded());
        assert_eq!(record.committed_stake(), dec!(0.0000000002));

        let record = sample_record(false);
        assert!(!record.succeeded());
        assert_eq!(record.committed_stake(), dec!(10));
    }

    #[test]
    fn leg_outcome_tagging() {
        let json = serde_json::to_string(&LegOutcome::Failed {
            reason: "no receipt".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"no receipt"}"#);
    }

    #[test]
    fn epoch_state_parses_its_own_names() {
        for state in [EpochState::Submitting, EpochState::Submitted] {
            assert_eq!(state.as_str().parse::<EpochState>().unwrap(), state);
        }
        assert!("pending".parse::<EpochState>().is_err());
        assert!("skipped".parse::<EpochState>().is_err());
    }

    #[test]
    fn submission_records_compare_by_value() {
        let record = sample_record(true);
        assert_eq!(record, record.clone());
        let mut other = record.clone();
        other.resubmission = None;
        assert_ne!(record, other);
    }
}
