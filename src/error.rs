use crate::domain::payment::EntryId;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// A record failed local checks before any collaborator was contacted.
    #[error("{0}")]
    Validation(String),
    #[error("Attachment error: {0}")]
    Attachment(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Remote query error: {0}")]
    RemoteQuery(String),
    #[error("No active ledger session; connect first")]
    NoSession,
    #[error("Select at least one payment")]
    NothingSelected,
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to persist a delivery outcome in the remote ledger.
///
/// Kept apart from [`DispatchError`] so that callers have to decide what to do
/// with it explicitly; the dispatch loop never propagates it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Remote update error for entry {entry}: {message}")]
pub struct RemoteUpdateError {
    pub entry: EntryId,
    pub message: String,
}

impl RemoteUpdateError {
    pub fn new(entry: EntryId, message: impl Into<String>) -> Self {
        Self {
            entry,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
