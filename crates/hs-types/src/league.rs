//! League tiers and per-league holder counts.
//!
//! Holders are grouped by the share of total supply they hold. There are
//! nine real tiers, ordered from the largest holders down, plus a synthetic
//! [`League::Total`] that carries the population-wide figures.
//!
//! # Boundaries
//!
//! Each tier covers `[min, max)` percent of supply. A holder sitting exactly
//! on a boundary belongs to the *higher* tier, so exactly `1%` is a
//! [`League::Whale`], not a [`League::Shark`]. The lowest tier starts at
//! zero, which makes the table exhaustive for any non-negative percentage.
//!
//! ```rust
//! use hs_types::League;
//! use rust_decimal_macros::dec;
//!
//! assert_eq!(League::for_percentage(dec!(10)), League::Poseidon);
//! assert_eq!(League::for_percentage(dec!(0.00001)), League::Plankton);
//! assert_eq!(League::from_id("whale").unwrap(), League::Whale);
//! ```

use crate::TypeError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage-of-supply tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum League {
    Poseidon,
    Whale,
    Shark,
    Dolphin,
    Fish,
    Octopus,
    Crab,
    Shrimp,
    Plankton,

    /// Synthetic tier holding population-wide totals.
    Total,
}

impl League {
    /// The nine real tiers, highest threshold first.
    pub const TIERS: [League; 9] = [
        League::Poseidon,
        League::Whale,
        League::Shark,
        League::Dolphin,
        League::Fish,
        League::Octopus,
        League::Crab,
        League::Shrimp,
        League::Plankton,
    ];

    /// Every league including [`League::Total`].
    pub const ALL: [League; 10] = [
        League::Poseidon,
        League::Whale,
        League::Shark,
        League::Dolphin,
        League::Fish,
        League::Octopus,
        League::Crab,
        League::Shrimp,
        League::Plankton,
        League::Total,
    ];

    /// Stable identifier used in storage and API responses.
    pub fn id(&self) -> &'static str {
        match self {
            League::Poseidon => "poseidon",
            League::Whale => "whale",
            League::Shark => "shark",
            League::Dolphin => "dolphin",
            League::Fish => "fish",
            League::Octopus => "octopus",
            League::Crab => "crab",
            League::Shrimp => "shrimp",
            League::Plankton => "plankton",
            League::Total => "total",
        }
    }

    /// Parse a league identifier (case-insensitive).
    pub fn from_id(id: &str) -> Result<Self, TypeError> {
        League::ALL
            .into_iter()
            .find(|league| league.id().eq_ignore_ascii_case(id.trim()))
            .ok_or_else(|| TypeError::InvalidLeague(id.to_string()))
    }

    /// Inclusive lower bound, in percent of total supply.
    ///
    /// Returns `None` for [`League::Total`].
    pub fn min_percentage(&self) -> Option<Decimal> {
        let min = match self {
            League::Poseidon => Decimal::new(10, 0),
            League::Whale => Decimal::ONE,
            League::Shark => Decimal::new(5, 1),
            League::Dolphin => Decimal::new(1, 1),
            League::Fish => Decimal::new(5, 2),
            League::Octopus => Decimal::new(1, 2),
            League::Crab => Decimal::new(1, 3),
            League::Shrimp => Decimal::new(1, 4),
            League::Plankton => Decimal::ZERO,
            League::Total => return None,
        };
        Some(min)
    }

    /// Exclusive upper bound, in percent of total supply.
    ///
    /// The top tier reports 100. Returns `None` for [`League::Total`].
    pub fn max_percentage(&self) -> Option<Decimal> {
        match self {
            League::Poseidon => Some(Decimal::ONE_HUNDRED),
            League::Total => None,
            _ => {
                let idx = League::TIERS.iter().position(|l| l == self)?;
                League::TIERS[idx - 1].min_percentage()
            }
        }
    }

    /// Assign a percentage of supply to its tier.
    ///
    /// Tiers are scanned from the highest threshold down and the first one
    /// with `percentage >= min` wins. Negative input falls into the lowest
    /// tier.
    pub fn for_percentage(percentage: Decimal) -> League {
        League::TIERS
            .into_iter()
            .find(|league| {
                league
                    .min_percentage()
                    .is_some_and(|min| percentage >= min)
            })
            .unwrap_or(League::Plankton)
    }

    /// Returns true for the synthetic total tier.
    #[inline]
    pub fn is_total(&self) -> bool {
        matches!(self, League::Total)
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<League> for String {
    fn from(league: League) -> Self {
        league.id().to_string()
    }
}

impl TryFrom<String> for League {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        League::from_id(&s)
    }
}

/// Holder counts for one league on one snapshot date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueBucket {
    /// The league these counts belong to.
    pub league: League,

    /// Date of the snapshot that was classified.
    pub snapshot_date: NaiveDate,

    /// Holders in this league, contracts included.
    pub all_holder_count: u64,

    /// Holders in this league, contracts excluded.
    pub user_holder_count: u64,

    /// `user_holder_count` from the prior-week snapshot (0 if none).
    pub last_week_user_holder_count: u64,

    /// `user_holder_count - last_week_user_holder_count`.
    pub holder_count_delta: i64,
}

impl LeagueBucket {
    /// Create an empty bucket with no prior-week data.
    pub fn empty(league: League, snapshot_date: NaiveDate) -> Self {
        Self {
            league,
            snapshot_date,
            all_holder_count: 0,
            user_holder_count: 0,
            last_week_user_holder_count: 0,
            holder_count_delta: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exact_boundaries_go_to_higher_tier() {
        assert_eq!(League::for_percentage(dec!(10)), League::Poseidon);
        assert_eq!(League::for_percentage(dec!(1.0)), League::Whale);
        assert_eq!(League::for_percentage(dec!(0.5)), League::Shark);
        assert_eq!(League::for_percentage(dec!(0.1)), League::Dolphin);
        assert_eq!(League::for_percentage(dec!(0.05)), League::Fish);
        assert_eq!(League::for_percentage(dec!(0.01)), League::Octopus);
        assert_eq!(League::for_percentage(dec!(0.001)), League::Crab);
        assert_eq!(League::for_percentage(dec!(0.0001)), League::Shrimp);
        assert_eq!(League::for_percentage(dec!(0)), League::Plankton);
    }

    #[test]
    fn test_just_below_boundary() {
        assert_eq!(League::for_percentage(dec!(0.9999999)), League::Shark);
        assert_eq!(League::for_percentage(dec!(9.99)), League::Whale);
        assert_eq!(League::for_percentage(dec!(0.00009)), League::Plankton);
    }

    #[test]
    fn test_out_of_range_inputs() {
        assert_eq!(League::for_percentage(dec!(100)), League::Poseidon);
        assert_eq!(League::for_percentage(dec!(250)), League::Poseidon);
        assert_eq!(League::for_percentage(dec!(-1)), League::Plankton);
    }

    #[test]
    fn test_ranges_are_contiguous() {
        for pair in League::TIERS.windows(2) {
            assert_eq!(pair[1].max_percentage(), pair[0].min_percentage());
        }
        assert_eq!(League::Plankton.min_percentage(), Some(Decimal::ZERO));
        assert_eq!(League::Total.min_percentage(), None);
        assert_eq!(League::Total.max_percentage(), None);
    }

    #[test]
    fn test_every_tier_contains_its_own_min() {
        for league in League::TIERS {
            let min = league.min_percentage().unwrap();
            assert_eq!(League::for_percentage(min), league);
        }
    }

    #[test]
    fn test_id_roundtrip_and_case() {
        for league in League::ALL {
            assert_eq!(League::from_id(league.id()).unwrap(), league);
        }
        assert_eq!(League::from_id("WHALE").unwrap(), League::Whale);
        assert!(League::from_id("kraken").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&League::Dolphin).unwrap();
        assert_eq!(json, "\"dolphin\"");
        let parsed: League = serde_json::from_str("\"total\"").unwrap();
        assert_eq!(parsed, League::Total);
    }

    #[test]
    fn test_bucket_serializes_camel_case() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let bucket = LeagueBucket::empty(League::Crab, date);
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json["league"], "crab");
        assert_eq!(json["userHolderCount"], 0);
        assert_eq!(json["holderCountDelta"], 0);
        assert_eq!(json["snapshotDate"], "2026-01-10");
    }
}
