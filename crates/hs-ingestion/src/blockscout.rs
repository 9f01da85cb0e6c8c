//! Blockscout holder-listing client.
//!
//! # Endpoints
//!
//! - `GET /api/v2/tokens/{token}/holders?{next_page_params}`
//! - `GET /api/v2/tokens/{token}`
//! - `GET /api/v2/tokens/{token}/counters`
//!
//! # Status Mapping
//!
//! A 404 becomes [`IngestionError::NotFound`] so the pager can count it
//! toward the end-of-data heuristic. Every other non-success status becomes
//! [`IngestionError::Http`].

use crate::config::SourceConfig;
use crate::error::IngestionError;
use crate::types::{HolderPage, TokenCounters, TokenInfo};
use crate::{HolderSource, PageParams};
use serde::de::DeserializeOwned;
use url::Url;

/// Production source backed by a Blockscout instance.
///
/// # Example
///
/// ```rust,no_run
/// use hs_ingestion::{BlockscoutSource, HolderSource, SourceConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let source = BlockscoutSource::new(SourceConfig::new("0x..."))?;
///     println!("Holders: {}", source.get_holder_count().await?);
///     Ok(())
/// }
/// ```
pub struct BlockscoutSource {
    http_client: reqwest::Client,
    base_url: Url,
    config: SourceConfig,
}

impl BlockscoutSource {
    /// Create a source for the configured token.
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Config`] if the base URL does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: SourceConfig) -> Result<Self, IngestionError> {
        let base_url = Url::parse(&config.base_url)?;
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IngestionError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            config,
        })
    }

    /// The configuration this source was built with.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn token_url(&self, suffix: &str) -> Result<Url, IngestionError> {
        let path = format!("/api/v2/tokens/{}{}", self.config.token_address, suffix);
        Ok(self.base_url.join(&path)?)
    }

    /// GET `url` and decode the JSON body, mapping statuses as documented
    /// at module level.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(String, String)],
    ) -> Result<T, IngestionError> {
        let response = self.http_client.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IngestionError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(IngestionError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

impl HolderSource for BlockscoutSource {
    async fn get_holders_page(
        &self,
        params: Option<&PageParams>,
    ) -> Result<HolderPage, IngestionError> {
        let url = self.token_url("/holders")?;
        let query = params.map(PageParams::to_query_pairs).unwrap_or_default();

        tracing::debug!("Fetching holders page from {} ({} params)", url, query.len());

        self.get_json(url, &query).await
    }

    async fn get_token_info(&self) -> Result<TokenInfo, IngestionError> {
        let url = self.token_url("")?;
        self.get_json(url, &[]).await
    }

    async fn get_holder_count(&self) -> Result<u64, IngestionError> {
        let url = self.token_url("/counters")?;
        let counters: TokenCounters = self.get_json(url, &[]).await?;
        Ok(counters.token_holders_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_urls() {
        let config = SourceConfig::new("0xabc").with_base_url("https://example.org/");
        let source = BlockscoutSource::new(config).unwrap();

        assert_eq!(
            source.token_url("/holders").unwrap().as_str(),
            "https://example.org/api/v2/tokens/0xabc/holders"
        );
        assert_eq!(
            source.token_url("").unwrap().as_str(),
            "https://example.org/api/v2/tokens/0xabc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SourceConfig::new("0xabc").with_base_url("not a url");
        assert!(matches!(
            BlockscoutSource::new(config),
            Err(IngestionError::Config(_))
        ));
    }
}
