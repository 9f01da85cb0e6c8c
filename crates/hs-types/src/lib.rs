//! hs-types: Shared data structures for the holder league pipeline
//!
//! This crate defines all shared types used across the workspace including:
//! - [`HolderRecord`] - One holder's balance in a daily snapshot
//! - [`League`] - The nine percentage-of-supply tiers plus the synthetic total
//! - [`LeagueBucket`] - Per-league holder counts for one snapshot date
//! - [`ProgressState`] - The persisted collection cursor for a job and date
//! - [`JobPhase`] - The explicit state of a daily collection cycle
//!
//! # Example
//!
//! ```rust
//! use hs_types::League;
//! use rust_decimal_macros::dec;
//!
//! // Exactly 1% of supply is a whale, not a shark
//! assert_eq!(League::for_percentage(dec!(1)), League::Whale);
//! assert_eq!(League::for_percentage(dec!(0.99)), League::Shark);
//! ```

mod error;
mod holder;
mod league;
mod progress;

pub use error::TypeError;
pub use holder::{normalize_address, scale_raw_amount, HolderRecord};
pub use league::{League, LeagueBucket};
pub use progress::{JobPhase, LastRecord, PageParams, ProgressState, ProgressUpdate};
