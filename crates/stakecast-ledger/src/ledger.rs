use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stakecast_models::submission::{EpochState, SubmissionRecord};

use crate::error::LedgerError;

/// What the ledger knows about one epoch.
///
/// An entry is created in the `Submitting` state before any transaction goes
/// out and is completed with the full record once both legs have settled. An
/// entry left in `Submitting` means the process stopped mid-submission; the
/// epoch is still treated as taken.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub epoch: u64,
    pub target_slot: u64,
    pub state: EpochState,
    pub reserved_at: DateTime<Utc>,
    pub record: Option<SubmissionRecord>,
}

impl LedgerEntry {
    pub fn is_complete(&self) -> bool {
        self.record.is_some()
    }
}

/// Durable set of epochs the agent has acted on.
///
/// At most one entry exists per epoch. `reserve` is the only way to create
/// one, so a second reservation of the same epoch always fails with
/// [`LedgerError::AlreadyReserved`].
pub trait SubmissionLedger: Send {
    fn contains(&self, epoch: u64) -> Result<bool, LedgerError>;

    fn reserve(&mut self, epoch: u64, target_slot: u64) -> Result<(), LedgerError>;

    /// Attach the final record to a reserved epoch.
    fn complete(&mut self, record: &SubmissionRecord) -> Result<(), LedgerError>;

    fn get(&self, epoch: u64) -> Result<Option<LedgerEntry>, LedgerError>;

    /// All epochs with an entry, ascending.
    fn epochs(&self) -> Result<Vec<u64>, LedgerError>;

    /// Completed records, ascending by epoch.
    fn records(&self) -> Result<Vec<SubmissionRecord>, LedgerError> {
        let mut records = Vec::new();
        for epoch in self.epochs()? {
            if let Some(record) = self.get(epoch)?.and_then(|e| e.record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stakecast_models::decision::StakeSplit;
    use stakecast_models::direction::PerDirection;
    use stakecast_models::submission::{LegAttempt, LegOutcome};

    pub fn record(epoch: u64) -> SubmissionRecord {
        let confirmed = LegOutcome::Confirmed {
            tx_hash: Some(format!("0x{epoch:x}")),
        };
        SubmissionRecord {
            epoch,
            target_slot: (epoch + 2) * 300,
            first_attempt: LegAttempt {
                stakes: StakeSplit {
                    stake_up: dec!(6),
                    stake_down: dec!(4),
                },
                outcomes: PerDirection::new(confirmed.clone(), confirmed),
            },
            resubmission: None,
            state: EpochState::Submitted,
            submitted_at: Utc::now(),
        }
    }

    /// Behaviour every ledger implementation must share.
    pub fn exercise_ledger(ledger: &mut dyn SubmissionLedger) {
        assert!(!ledger.contains(10).unwrap());
        assert!(ledger.get(10).unwrap().is_none());

        ledger.reserve(10, 3600).unwrap();
        assert!(ledger.contains(10).unwrap());
        let entry = ledger.get(10).unwrap().unwrap();
        assert_eq!(entry.state, EpochState::Submitting);
        assert_eq!(entry.target_slot, 3600);
        assert!(!entry.is_complete());

        assert!(matches!(
            ledger.reserve(10, 3600),
            Err(LedgerError::AlreadyReserved(10))
        ));

        assert!(matches!(
            ledger.complete(&record(11)),
            Err(LedgerError::NotReserved(11))
        ));

        let rec = record(10);
        ledger.complete(&rec).unwrap();
        let entry = ledger.get(10).unwrap().unwrap();
        assert_eq!(entry.state, EpochState::Submitted);
        assert_eq!(entry.record.as_ref(), Some(&rec));

        assert!(matches!(
            ledger.complete(&rec),
            Err(LedgerError::AlreadyComplete(10))
        ));

        ledger.reserve(7, 2700).unwrap();
        ledger.reserve(12, 4200).unwrap();
        assert_eq!(ledger.epochs().unwrap(), vec![7, 10, 12]);
        assert_eq!(ledger.records().unwrap(), vec![rec]);
    }
}
