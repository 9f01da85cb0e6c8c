//! Mock data source for testing.
//!
//! `MockSource` replays a script of holder-page responses in order and
//! records the cursor each request carried, so tests can assert exactly
//! where a resumed run picked up.
//!
//! # Usage
//!
//! ```rust
//! use hs_ingestion::{HolderSource, MockSource};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockSource::new()
//!     .with_page(MockSource::generated_page(0, 50, true))
//!     .with_not_found(3);
//!
//! let page = mock.get_holders_page(None).await.unwrap();
//! assert_eq!(page.items.len(), 50);
//! assert!(mock.get_holders_page(page.next_page_params.as_ref()).await.is_err());
//! # }
//! ```

use crate::error::IngestionError;
use crate::types::{AddressInfo, HolderItem, HolderPage, TokenInfo};
use crate::{HolderSource, PageParams};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted response for `get_holders_page`.
#[derive(Debug, Clone)]
enum Scripted {
    Page(HolderPage),
    NotFound,
    Failure(String),
}

/// Mock data source for testing.
///
/// Once the script runs out, every further page request answers 404, which
/// the pager eventually reads as end-of-data.
#[derive(Default)]
pub struct MockSource {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Option<PageParams>>>,

    /// Token info to return. If None, returns an error.
    pub token_info: Option<TokenInfo>,

    /// Holder count to return. If None, returns an error.
    pub holder_count: Option<u64>,
}

impl MockSource {
    /// Create a new empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page (builder pattern).
    pub fn with_page(self, page: HolderPage) -> Self {
        self.push(Scripted::Page(page));
        self
    }

    /// Queue `count` consecutive 404 responses (builder pattern).
    pub fn with_not_found(self, count: usize) -> Self {
        for _ in 0..count {
            self.push(Scripted::NotFound);
        }
        self
    }

    /// Queue a transient network failure (builder pattern).
    pub fn with_failure(self, message: &str) -> Self {
        self.push(Scripted::Failure(message.to_string()));
        self
    }

    /// Set the token info to return (builder pattern).
    pub fn with_token_info(mut self, info: TokenInfo) -> Self {
        self.token_info = Some(info);
        self
    }

    /// Set the holder count to return (builder pattern).
    pub fn with_holder_count(mut self, count: u64) -> Self {
        self.holder_count = Some(count);
        self
    }

    /// Cursors received so far, in request order.
    pub fn requests(&self) -> Vec<Option<PageParams>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Build a page of `count` holders with deterministic addresses.
    ///
    /// Holder `i` gets address `0x{i:040x}` and a raw balance of
    /// `(i + 1) * 10^18`. Contracts are every tenth index. When `has_next`
    /// is set, the page carries a cursor shaped like the real API's.
    pub fn generated_page(first: usize, count: usize, has_next: bool) -> HolderPage {
        let items: Vec<HolderItem> = (first..first + count)
            .map(|i| HolderItem {
                address: AddressInfo {
                    hash: format!("0x{:040x}", i),
                    is_contract: i % 10 == 9,
                },
                value: format!("{}000000000000000000", i + 1),
            })
            .collect();

        let next_page_params = match (has_next, items.last()) {
            (true, Some(last)) => {
                let mut params = Map::new();
                params.insert("address_hash".into(), Value::String(last.address.hash.clone()));
                params.insert("value".into(), Value::String(last.value.clone()));
                params.insert("items_count".into(), Value::from(first + count));
                Some(PageParams::new(params))
            }
            _ => None,
        };

        HolderPage {
            items,
            next_page_params,
        }
    }

    fn push(&self, entry: Scripted) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }
}

impl HolderSource for MockSource {
    async fn get_holders_page(
        &self,
        params: Option<&PageParams>,
    ) -> Result<HolderPage, IngestionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(params.cloned());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());

        match next {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Failure(message)) => Err(IngestionError::Network(message)),
            Some(Scripted::NotFound) | None => {
                Err(IngestionError::NotFound("mock holders page".into()))
            }
        }
    }

    async fn get_token_info(&self) -> Result<TokenInfo, IngestionError> {
        self.token_info
            .clone()
            .ok_or_else(|| IngestionError::NoData("mock token info not configured".into()))
    }

    async fn get_holder_count(&self) -> Result<u64, IngestionError> {
        self.holder_count
            .ok_or_else(|| IngestionError::NoData("mock holder count not configured".into()))
    }
}
