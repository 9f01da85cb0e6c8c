//! Configuration for the ingestion layer.
//!
//! # Environment Variables
//!
//! - `HOLDERS_API_URL`: Base URL of the Blockscout-style API (default: `https://eth.blockscout.com`)
//! - `TOKEN_ADDRESS`: Contract address of the tracked token (required)
//! - `TOKEN_DECIMALS`: Fixed-point scale of raw balances (default: 18)
//! - `HTTP_TIMEOUT_SECS`: Per-request timeout (default: 30)

use crate::error::IngestionError;
use std::env;
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://eth.blockscout.com";

/// Default token scale (most ERC-20 tokens).
pub const DEFAULT_DECIMALS: u32 = 18;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and what to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// API base URL, without a trailing path.
    pub base_url: String,

    /// Token contract address.
    pub token_address: String,

    /// Number of decimals in raw balances.
    pub decimals: u32,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl SourceConfig {
    /// Config for `token_address` with default URL, scale and timeout.
    pub fn new(token_address: &str) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token_address: token_address.to_string(),
            decimals: DEFAULT_DECIMALS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the API base URL (builder pattern).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the token scale (builder pattern).
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Config`] if `TOKEN_ADDRESS` is unset or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, IngestionError> {
        let token_address = env::var("TOKEN_ADDRESS")
            .map_err(|_| IngestionError::Config("TOKEN_ADDRESS is not set".into()))?;

        let mut config = Self::new(&token_address);

        if let Ok(url) = env::var("HOLDERS_API_URL") {
            config = config.with_base_url(&url);
        }
        if let Ok(decimals) = env::var("TOKEN_DECIMALS") {
            config.decimals = decimals
                .parse()
                .map_err(|_| IngestionError::Config(format!("bad TOKEN_DECIMALS: {}", decimals)))?;
        }
        if let Ok(secs) = env::var("HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| IngestionError::Config(format!("bad HTTP_TIMEOUT_SECS: {}", secs)))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::new("0xabc");
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.decimals, 18);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = SourceConfig::new("0xabc").with_base_url("https://example.org/");
        assert_eq!(config.base_url, "https://example.org");
    }
}
