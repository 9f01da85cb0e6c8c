//! League classification of a holder snapshot.

use crate::error::IndexerError;
use chrono::NaiveDate;
use hs_types::{HolderRecord, League, LeagueBucket};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Share of `total_supply` held by `balance`, in percent.
///
/// A quotient too large to represent can only come from a balance far above
/// supply, so it is reported as `None` and treated as the top tier.
fn percentage_of_supply(balance: Decimal, total_supply: Decimal) -> Option<Decimal> {
    balance
        .checked_div(total_supply)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
}

/// Group `holders` into leagues by their share of `total_supply`.
///
/// Returns one bucket per entry of [`League::ALL`], in that order, with
/// prior-week fields zeroed. Tiers nobody falls into are still present with
/// zero counts. Contracts count toward `all_holder_count` only.
///
/// The [`League::Total`] bucket describes the whole population rather than
/// the sample: its `all_holder_count` is `total_holder_count` and its
/// `user_holder_count` is that figure less the sampled contracts, never
/// below the sampled user count.
///
/// # Errors
///
/// [`IndexerError::InvalidSupply`] if `total_supply` is not positive.
pub fn classify_holders(
    holders: &[HolderRecord],
    total_supply: Decimal,
    total_holder_count: u64,
    date: NaiveDate,
) -> Result<Vec<LeagueBucket>, IndexerError> {
    if total_supply <= Decimal::ZERO {
        return Err(IndexerError::InvalidSupply(total_supply));
    }

    let mut buckets: BTreeMap<League, LeagueBucket> = League::ALL
        .into_iter()
        .map(|league| (league, LeagueBucket::empty(league, date)))
        .collect();

    let mut contracts = 0u64;
    let mut users = 0u64;

    for holder in holders {
        let league = match percentage_of_supply(holder.balance, total_supply) {
            Some(pct) => League::for_percentage(pct),
            None => League::Poseidon,
        };

        if let Some(bucket) = buckets.get_mut(&league) {
            bucket.all_holder_count += 1;
            if holder.is_contract {
                contracts += 1;
            } else {
                bucket.user_holder_count += 1;
                users += 1;
            }
        }
    }

    if let Some(total) = buckets.get_mut(&League::Total) {
        total.all_holder_count = total_holder_count;
        total.user_holder_count = total_holder_count.saturating_sub(contracts).max(users);
    }

    Ok(buckets.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn holder(n: u32, balance: Decimal, is_contract: bool) -> HolderRecord {
        HolderRecord {
            address: format!("0x{:040x}", n),
            is_contract,
            balance,
        }
    }

    fn bucket(buckets: &[LeagueBucket], league: League) -> &LeagueBucket {
        buckets.iter().find(|b| b.league == league).unwrap()
    }

    #[test]
    fn test_boundaries_go_to_higher_tier() {
        let supply = dec!(1000);
        let holders = vec![
            holder(1, dec!(100), false),   // 10%
            holder(2, dec!(10), false),    // 1%
            holder(3, dec!(9.99), false),  // 0.999%
            holder(4, dec!(0.001), false), // 0.0001%
            holder(5, dec!(0), false),
        ];

        let buckets = classify_holders(&holders, supply, 5, date()).unwrap();
        assert_eq!(bucket(&buckets, League::Poseidon).all_holder_count, 1);
        assert_eq!(bucket(&buckets, League::Whale).all_holder_count, 1);
        assert_eq!(bucket(&buckets, League::Shark).all_holder_count, 1);
        assert_eq!(bucket(&buckets, League::Shrimp).all_holder_count, 1);
        assert_eq!(bucket(&buckets, League::Plankton).all_holder_count, 1);
    }

    #[test]
    fn test_every_holder_lands_in_exactly_one_tier() {
        let supply = dec!(1000000);
        let holders: Vec<_> = (0..500u32)
            .map(|i| holder(i, Decimal::from(i * 37 % 1000) * dec!(3.7), i % 7 == 0))
            .collect();

        let buckets = classify_holders(&holders, supply, 500, date()).unwrap();
        assert_eq!(buckets.len(), League::ALL.len());

        let sum: u64 = buckets
            .iter()
            .filter(|b| !b.league.is_total())
            .map(|b| b.all_holder_count)
            .sum();
        assert_eq!(sum, 500);
    }

    #[test]
    fn test_contracts_excluded_from_user_counts() {
        let holders = vec![
            holder(1, dec!(20), true),
            holder(2, dec!(20), false),
            holder(3, dec!(0.5), true),
        ];

        let buckets = classify_holders(&holders, dec!(100), 1000, date()).unwrap();
        let poseidon = bucket(&buckets, League::Poseidon);
        assert_eq!(poseidon.all_holder_count, 2);
        assert_eq!(poseidon.user_holder_count, 1);

        let total = bucket(&buckets, League::Total);
        assert_eq!(total.all_holder_count, 1000);
        assert_eq!(total.user_holder_count, 998);
    }

    #[test]
    fn test_total_user_count_never_below_sample() {
        let holders: Vec<_> = (0..10u32).map(|i| holder(i, dec!(1), false)).collect();

        // Stale external count smaller than the sample
        let buckets = classify_holders(&holders, dec!(1000), 4, date()).unwrap();
        let total = bucket(&buckets, League::Total);
        assert_eq!(total.all_holder_count, 4);
        assert_eq!(total.user_holder_count, 10);
    }

    #[test]
    fn test_balance_above_supply_is_poseidon() {
        let holders = vec![holder(1, Decimal::MAX, false)];
        let buckets = classify_holders(&holders, dec!(0.0000001), 1, date()).unwrap();
        assert_eq!(bucket(&buckets, League::Poseidon).all_holder_count, 1);
    }

    #[test]
    fn test_rejects_non_positive_supply() {
        assert!(matches!(
            classify_holders(&[], Decimal::ZERO, 0, date()),
            Err(IndexerError::InvalidSupply(_))
        ));
        assert!(classify_holders(&[], dec!(-5), 0, date()).is_err());
    }

    #[test]
    fn test_empty_sample_yields_all_tiers() {
        let buckets = classify_holders(&[], dec!(1), 0, date()).unwrap();
        assert_eq!(buckets.len(), 10);
        assert!(buckets.iter().all(|b| b.all_holder_count == 0));
        assert_eq!(buckets[0].league, League::Poseidon);
        assert_eq!(buckets[9].league, League::Total);
    }
}
