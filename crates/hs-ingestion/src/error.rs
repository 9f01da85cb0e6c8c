//! Error types for the ingestion layer.
//!
//! External errors are converted into owned strings right away, so the
//! enum has no generic parameters and no boxed sources.

use thiserror::Error;

/// Errors that can occur during data ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered 404. For holder pages, a run of these is how the API
    /// signals that no more pages exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration errors (e.g., missing env vars).
    #[error("config error: {0}")]
    Config(String),

    /// No data available (e.g., mock not configured).
    #[error("no data: {0}")]
    NoData(String),

    /// A page could not be fetched within the retry budget.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl IngestionError {
    /// Returns true for a 404 response.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestionError::NotFound(_))
    }
}

// Convert from reqwest::Error (direct API calls) to our error type.
impl From<reqwest::Error> for IngestionError {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IngestionError::Decode(err.to_string())
        } else {
            IngestionError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for IngestionError {
    #[inline]
    fn from(err: url::ParseError) -> Self {
        IngestionError::Config(format!("invalid URL: {}", err))
    }
}
