//! Week-over-week changes in league membership.

use chrono::{Days, NaiveDate};
use hs_types::{League, LeagueBucket};
use std::collections::HashMap;

/// How far back the comparison snapshot is taken from.
pub const DELTA_WINDOW_DAYS: u64 = 7;

/// Latest date whose classification counts as "last week" for `date`.
pub fn prior_week_cutoff(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(DELTA_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

/// Fill in the prior-week fields of `current` from `prior`.
///
/// A league missing from `prior` is compared against zero, so its delta is
/// its full current user count.
pub fn apply_deltas(mut current: Vec<LeagueBucket>, prior: &[LeagueBucket]) -> Vec<LeagueBucket> {
    let previous: HashMap<League, u64> = prior
        .iter()
        .map(|b| (b.league, b.user_holder_count))
        .collect();

    for bucket in &mut current {
        let last_week = previous.get(&bucket.league).copied().unwrap_or(0);
        bucket.last_week_user_holder_count = last_week;
        bucket.holder_count_delta = signed(bucket.user_holder_count) - signed(last_week);
    }

    current
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn with_users(league: League, d: NaiveDate, users: u64) -> LeagueBucket {
        LeagueBucket {
            user_holder_count: users,
            all_holder_count: users,
            ..LeagueBucket::empty(league, d)
        }
    }

    #[test]
    fn test_growth_and_shrink() {
        let current = vec![
            with_users(League::Whale, date(9), 120),
            with_users(League::Crab, date(9), 40),
        ];
        let prior = vec![
            with_users(League::Whale, date(2), 100),
            with_users(League::Crab, date(2), 55),
        ];

        let result = apply_deltas(current, &prior);
        assert_eq!(result[0].holder_count_delta, 20);
        assert_eq!(result[0].last_week_user_holder_count, 100);
        assert_eq!(result[1].holder_count_delta, -15);
    }

    #[test]
    fn test_missing_prior_counts_as_zero() {
        let current = vec![with_users(League::Shark, date(9), 7)];
        let result = apply_deltas(current, &[]);
        assert_eq!(result[0].last_week_user_holder_count, 0);
        assert_eq!(result[0].holder_count_delta, 7);
    }

    #[test]
    fn test_prior_week_cutoff() {
        assert_eq!(prior_week_cutoff(date(9)), date(2));
        assert_eq!(
            prior_week_cutoff(date(3)),
            NaiveDate::from_ymd_opt(2026, 2, 24).unwrap()
        );
    }
}
