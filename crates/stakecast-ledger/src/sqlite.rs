use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use stakecast_models::submission::{EpochState, SubmissionRecord};
use tracing::debug;

use crate::error::LedgerError;
use crate::ledger::{LedgerEntry, SubmissionLedger};

pub const LEDGER_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS submissions (
    epoch       INTEGER PRIMARY KEY,
    target_slot INTEGER NOT NULL,
    state       TEXT NOT NULL,
    reserved_at TEXT NOT NULL,
    record_json TEXT
);";

/// Submission ledger persisted in SQLite so restarts never resubmit an epoch.
///
/// The epoch is the primary key; a duplicate reservation is rejected by the
/// database itself.
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path` in WAL mode.
    pub fn open(path: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(LEDGER_TABLE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!(path, "Opened submission ledger");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(LEDGER_TABLE_DDL)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<usize, LedgerError> {
        let count: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn to_sql_int(epoch: u64, value: u64) -> Result<i64, LedgerError> {
    i64::try_from(value).map_err(|_| LedgerError::Corrupt {
        epoch,
        reason: format!("{value} does not fit in an SQLite integer"),
    })
}

fn from_sql_int(epoch: u64, value: i64) -> Result<u64, LedgerError> {
    u64::try_from(value).map_err(|_| LedgerError::Corrupt {
        epoch,
        reason: format!("negative integer {value}"),
    })
}

impl SubmissionLedger for SqliteLedger {
    fn contains(&self, epoch: u64) -> Result<bool, LedgerError> {
        let key = to_sql_int(epoch, epoch)?;
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM submissions WHERE epoch = ?1")?;
        Ok(stmt.exists(rusqlite::params![key])?)
    }

    fn reserve(&mut self, epoch: u64, target_slot: u64) -> Result<(), LedgerError> {
        let key = to_sql_int(epoch, epoch)?;
        let slot = to_sql_int(epoch, target_slot)?;
        let result = self.conn.execute(
            "INSERT INTO submissions (epoch, target_slot, state, reserved_at) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                key,
                slot,
                EpochState::Submitting.as_str(),
                Utc::now().to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::AlreadyReserved(epoch))
            }
            Err(e) => Err(LedgerError::Sqlite(e)),
        }
    }

    fn complete(&mut self, record: &SubmissionRecord) -> Result<(), LedgerError> {
        let key = to_sql_int(record.epoch, record.epoch)?;
        let json = serde_json::to_string(record)?;
        let updated = self.conn.execute(
            "UPDATE submissions SET state = ?2, record_json = ?3 \
             WHERE epoch = ?1 AND record_json IS NULL",
            rusqlite::params![key, record.state.as_str(), json],
        )?;
        if updated == 1 {
            return Ok(());
        }
        if self.contains(record.epoch)? {
            Err(LedgerError::AlreadyComplete(record.epoch))
        } else {
            Err(LedgerError::NotReserved(record.epoch))
        }
    }

    fn get(&self, epoch: u64) -> Result<Option<LedgerEntry>, LedgerError> {
        let key = to_sql_int(epoch, epoch)?;
        let mut stmt = self.conn.prepare_cached(
            "SELECT target_slot, state, reserved_at, record_json \
             FROM submissions WHERE epoch = ?1",
        )?;
        let row = stmt
            .query_row(rusqlite::params![key], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .optional()?;

        let Some((target_slot, state, reserved_at, record_json)) = row else {
            return Ok(None);
        };

        let state = state
            .parse::<EpochState>()
            .map_err(|reason| LedgerError::Corrupt { epoch, reason })?;
        let reserved_at = DateTime::parse_from_rfc3339(&reserved_at)
            .map_err(|e| LedgerError::Corrupt {
                epoch,
                reason: format!("bad reserved_at: {e}"),
            })?
            .with_timezone(&Utc);
        let record = record_json
            .map(|json| serde_json::from_str::<SubmissionRecord>(&json))
            .transpose()?;

        Ok(Some(LedgerEntry {
            epoch,
            target_slot: from_sql_int(epoch, target_slot)?,
            state,
            reserved_at,
            record,
        }))
    }

    fn epochs(&self) -> Result<Vec<u64>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT epoch FROM submissions ORDER BY epoch")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        keys.into_iter()
            .map(|k| from_sql_int(k.unsigned_abs(), k))
            .collect()
    }
}
