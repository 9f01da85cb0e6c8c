//! Wire types for the holder-listing API.
//!
//! These mirror the Blockscout v2 response shapes. Conversion into domain
//! types happens in the indexer.

use hs_types::PageParams;
use serde::{Deserialize, Deserializer, Serialize};

/// One page of `GET /api/v2/tokens/{token}/holders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderPage {
    /// Holders on this page, largest balance first.
    #[serde(default)]
    pub items: Vec<HolderItem>,

    /// Cursor for the following page, `null` on the last page.
    #[serde(default)]
    pub next_page_params: Option<PageParams>,
}

/// A single holder as the API reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderItem {
    /// Holder address details.
    pub address: AddressInfo,

    /// Balance in the token's smallest unit, as a decimal string.
    pub value: String,
}

/// Address details embedded in a holder item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Checksummed address.
    pub hash: String,

    /// Whether the address is a contract.
    #[serde(default)]
    pub is_contract: bool,
}

/// Subset of `GET /api/v2/tokens/{token}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Total supply in the smallest unit.
    #[serde(default)]
    pub total_supply: Option<String>,

    /// Token scale, reported as a string.
    #[serde(default)]
    pub decimals: Option<String>,

    /// Holder count, if this deployment reports it here.
    #[serde(default, alias = "holders", deserialize_with = "de_opt_count")]
    pub holders_count: Option<u64>,
}

/// Subset of `GET /api/v2/tokens/{token}/counters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCounters {
    /// Number of addresses holding the token.
    #[serde(deserialize_with = "de_count")]
    pub token_holders_count: u64,
}

/// Counts arrive as strings (`"1234"`) on most deployments and as numbers
/// on some. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(u64),
    String(String),
}

impl StringOrNumber {
    fn into_count<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            StringOrNumber::Number(n) => Ok(n),
            StringOrNumber::String(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    StringOrNumber::deserialize(deserializer)?.into_count()
}

fn de_opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_count)
        .transpose()
}
