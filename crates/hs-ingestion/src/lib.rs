//! # hs-ingestion
//!
//! Data ingestion layer for the token holder-listing API.
//!
//! This crate provides a [`HolderSource`] trait over a Blockscout-style REST
//! API, with a production implementation ([`BlockscoutSource`]) and a
//! scripted test double ([`MockSource`]).
//!
//! ## Design Principles
//!
//! - **Native async traits**: like the rest of the workspace, the trait uses
//!   `impl Future + Send` return types rather than `async_trait`.
//!
//! - **Thin wrapper**: one method per endpoint, returning wire types. Domain
//!   conversion belongs in the indexer.
//!
//! - **Retry is separate**: [`fetch_page_with_retry`] wraps any source with
//!   the bounded retry loop and the end-of-data heuristic, so the policy is
//!   testable without a network.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hs_ingestion::{BlockscoutSource, HolderSource, SourceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SourceConfig::new("0xdAC17F958D2ee523a2206206994597C13D831ec7");
//!     let source = BlockscoutSource::new(config)?;
//!
//!     // First page: no cursor
//!     let page = source.get_holders_page(None).await?;
//!     println!("Fetched {} holders", page.items.len());
//!
//!     // Next page: echo the cursor back
//!     if let Some(next) = page.next_page_params.as_ref() {
//!         let page2 = source.get_holders_page(Some(next)).await?;
//!         println!("Fetched {} more", page2.items.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## End of Data
//!
//! The holder endpoint has no explicit "last page" flag. A page with no
//! items, a `null` cursor, or three consecutive 404 responses all mean the
//! listing is exhausted. See [`RetryPolicy`].

mod blockscout;
pub mod config;
pub mod error;
mod mock;
mod pager;
mod types;

pub use blockscout::BlockscoutSource;
pub use config::SourceConfig;
pub use error::IngestionError;
pub use mock::MockSource;
pub use pager::{fetch_page_with_retry, PageOutcome, RetryPolicy};
pub use types::{AddressInfo, HolderItem, HolderPage, TokenCounters, TokenInfo};

// Re-export the cursor type so downstream crates need not depend on
// hs-types just to pass it around.
pub use hs_types::PageParams;

/// Data source abstraction for the holder-listing API.
///
/// ## Implementors
///
/// - [`BlockscoutSource`]: Production implementation over HTTP
/// - [`MockSource`]: Scripted responses for tests
///
/// The trait requires `Send + Sync` so a source can live inside shared
/// application state and be used from axum handlers.
pub trait HolderSource: Send + Sync {
    /// Fetch one page of holders.
    ///
    /// `params` is the opaque cursor from the previous page's
    /// `next_page_params`; `None` requests the first page.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::NotFound`] on a 404, which callers may
    /// treat as an end-of-data signal. Other failures are transient.
    fn get_holders_page(
        &self,
        params: Option<&PageParams>,
    ) -> impl std::future::Future<Output = Result<HolderPage, IngestionError>> + Send;

    /// Fetch token metadata, including the raw total supply.
    fn get_token_info(
        &self,
    ) -> impl std::future::Future<Output = Result<TokenInfo, IngestionError>> + Send;

    /// Fetch the true holder count from the counters endpoint.
    ///
    /// Unlike the paged listing, this is not capped by our sample size.
    fn get_holder_count(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, IngestionError>> + Send;
}
