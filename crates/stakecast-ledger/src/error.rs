use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Epoch {0} already has a submission entry")]
    AlreadyReserved(u64),

    #[error("Epoch {0} was never reserved")]
    NotReserved(u64),

    #[error("Epoch {0} is already complete")]
    AlreadyComplete(u64),

    #[error("Corrupt ledger row for epoch {epoch}: {reason}")]
    Corrupt { epoch: u64, reason: String },
}
