//! Error types for the storage layer.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while reading or writing persisted state.
///
/// None of these are recoverable inside an invocation: a failed write
/// aborts the run and the next invocation resumes from the last committed
/// progress row.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver or connection error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The progress row changed since it was read (version mismatch), or
    /// the requested transition is no longer valid.
    #[error("concurrent update of progress for {job} on {date}")]
    Conflict { job: String, date: NaiveDate },

    /// A stored value could not be mapped back to a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Domain type parsing error.
    #[error("type error: {0}")]
    Type(#[from] hs_types::TypeError),

    /// The store refused the write (used by the in-memory store to
    /// simulate outages).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn conflict(job: &str, date: NaiveDate) -> Self {
        StoreError::Conflict {
            job: job.to_string(),
            date,
        }
    }
}
