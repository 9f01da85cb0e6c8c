//! Application state for the API server.

use crate::error::ApiError;
use axum::http::{header, HeaderMap};
use hs_indexer::HolderPipeline;

/// Shared application state.
pub struct AppState<S, St, C> {
    /// The snapshot pipeline the job endpoint drives.
    pub pipeline: HolderPipeline<S, St, C>,

    /// Bearer credential required by protected endpoints.
    cron_secret: String,
}

impl<S, St, C> AppState<S, St, C> {
    /// Create a new application state.
    pub fn new(pipeline: HolderPipeline<S, St, C>, cron_secret: impl Into<String>) -> Self {
        Self {
            pipeline,
            cron_secret: cron_secret.into(),
        }
    }

    /// Check `Authorization: Bearer <secret>`.
    ///
    /// An empty configured secret rejects every request.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if !self.cron_secret.is_empty() && secrets_match(token, &self.cron_secret) => {
                Ok(())
            }
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// Compare secrets without short-circuiting on the first differing byte.
fn secrets_match(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
