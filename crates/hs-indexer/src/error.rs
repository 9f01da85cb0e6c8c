//! Error types for the indexer.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during a pipeline run.
///
/// Every variant aborts the invocation. Progress committed before the
/// failure stays committed, so the next invocation resumes from there.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Error from the ingestion layer (including exhausted retries).
    #[error("ingestion error: {0}")]
    Ingestion(#[from] hs_ingestion::IngestionError),

    /// Error from the storage layer.
    #[error("store error: {0}")]
    Store(#[from] hs_store::StoreError),

    /// Domain type error.
    #[error("type error: {0}")]
    Type(#[from] hs_types::TypeError),

    /// Total supply must be positive to compute percentages.
    #[error("invalid total supply: {0}")]
    InvalidSupply(Decimal),

    /// Bad configuration value.
    #[error("config error: {0}")]
    Config(String),
}

impl IndexerError {
    /// True when the run lost a race with another invocation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, IndexerError::Store(hs_store::StoreError::Conflict { .. }))
    }
}
