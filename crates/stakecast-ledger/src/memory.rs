use std::collections::BTreeMap;

use chrono::Utc;
use stakecast_models::submission::{EpochState, SubmissionRecord};

use crate::error::LedgerError;
use crate::ledger::{LedgerEntry, SubmissionLedger};

/// Process-local ledger. Forgets everything on restart.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: BTreeMap<u64, LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SubmissionLedger for MemoryLedger {
    fn contains(&self, epoch: u64) -> Result<bool, LedgerError> {
        Ok(self.entries.contains_key(&epoch))
    }

    fn reserve(&mut self, epoch: u64, target_slot: u64) -> Result<(), LedgerError> {
        if self.entries.contains_key(&epoch) {
            return Err(LedgerError::AlreadyReserved(epoch));
        }
        self.entries.insert(
            epoch,
            LedgerEntry {
                epoch,
                target_slot,
                state: EpochState::Submitting,
                reserved_at: Utc::now(),
                record: None,
            },
        );
        Ok(())
    }

    fn complete(&mut self, record: &SubmissionRecord) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .get_mut(&record.epoch)
            .ok_or(LedgerError::NotReserved(record.epoch))?;
        if entry.is_complete() {
            return Err(LedgerError::AlreadyComplete(record.epoch));
        }
        entry.state = record.state;
        entry.record = Some(record.clone());
        Ok(())
    }

    fn get(&self, epoch: u64) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.get(&epoch).cloned())
    }

    fn epochs(&self) -> Result<Vec<u64>, LedgerError> {
        Ok(self.entries.keys().copied().collect())
    }
}
