//! Error types for hs-types.

use thiserror::Error;

/// Errors that can occur when working with types.
#[derive(Debug, Error)]
pub enum TypeError {
    /// Address is not `0x` followed by 40 hex characters.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Raw token amount could not be parsed or scaled.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown league identifier.
    #[error("invalid league: {0}")]
    InvalidLeague(String),

    /// Unknown job phase tag.
    #[error("invalid job phase: {0}")]
    InvalidPhase(String),

    /// Decimal parsing error.
    #[error("decimal error: {0}")]
    Decimal(#[from] rust_decimal::Error),
}
