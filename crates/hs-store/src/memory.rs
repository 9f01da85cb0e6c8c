//! In-memory store for tests and local runs.
//!
//! `MemoryStore` implements the same contract as [`PgStore`](crate::PgStore),
//! including version checks and the atomic rotation, behind a single
//! `tokio::sync::Mutex`. It also counts rotations and can be told to fail
//! holder writes, which lets tests observe the backup-once and
//! abort-on-write-failure behavior directly.

use crate::{SnapshotStore, StoreError};
use chrono::NaiveDate;
use hs_types::{HolderRecord, JobPhase, League, LeagueBucket, ProgressState, ProgressUpdate};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    progress: HashMap<(String, NaiveDate), ProgressState>,
    live: BTreeMap<NaiveDate, BTreeMap<String, HolderRecord>>,
    backup: Vec<(NaiveDate, HolderRecord)>,
    leagues: BTreeMap<NaiveDate, BTreeMap<League, LeagueBucket>>,
}

/// In-process implementation of [`SnapshotStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    rotations: AtomicU32,
    fail_holder_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the backup-and-truncate rotation has run.
    pub fn rotation_count(&self) -> u32 {
        self.rotations.load(Ordering::SeqCst)
    }

    /// Make subsequent `insert_holders` calls fail (or succeed again).
    pub fn set_fail_holder_writes(&self, fail: bool) {
        self.fail_holder_writes.store(fail, Ordering::SeqCst);
    }

    /// Rows currently in the backup table.
    pub async fn backup_len(&self) -> usize {
        self.inner.lock().await.backup.len()
    }

    /// Seed live holders for a date, bypassing progress (test setup).
    pub async fn seed_holders(&self, date: NaiveDate, records: &[HolderRecord]) {
        let mut inner = self.inner.lock().await;
        let day = inner.live.entry(date).or_default();
        for record in records {
            day.insert(record.address.clone(), record.clone());
        }
    }
}

impl SnapshotStore for MemoryStore {
    async fn get_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> Result<Option<ProgressState>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.progress.get(&(job.to_string(), date)).cloned())
    }

    async fn load_or_init_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> Result<ProgressState, StoreError> {
        let mut inner = self.inner.lock().await;
        let state = inner
            .progress
            .entry((job.to_string(), date))
            .or_insert_with(|| ProgressState::new(job, date));
        Ok(state.clone())
    }

    async fn save_progress(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
        update: &ProgressUpdate,
    ) -> Result<ProgressState, StoreError> {
        let mut inner = self.inner.lock().await;
        let state = inner
            .progress
            .get_mut(&(job.to_string(), date))
            .filter(|s| s.version == expected_version)
            .ok_or_else(|| StoreError::conflict(job, date))?;

        state.apply(update);
        Ok(state.clone())
    }

    async fn begin_cycle(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
    ) -> Result<ProgressState, StoreError> {
        let mut inner = self.inner.lock().await;

        let state = inner
            .progress
            .get_mut(&(job.to_string(), date))
            .filter(|s| s.version == expected_version && s.phase == JobPhase::NotStarted)
            .ok_or_else(|| StoreError::conflict(job, date))?;

        state.apply(&ProgressUpdate {
            last_page: Some(0),
            continuation_token: Some(None),
            total_collected: Some(0),
            phase: Some(JobPhase::Collecting),
            last_record: None,
        });
        let claimed = state.clone();

        let live = std::mem::take(&mut inner.live);
        inner.backup = live
            .into_iter()
            .flat_map(|(day, holders)| holders.into_values().map(move |h| (day, h)))
            .collect();

        self.rotations.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            "Rotated snapshot for {} on {}: {} rows backed up",
            job,
            date,
            inner.backup.len()
        );

        Ok(claimed)
    }

    async fn insert_holders(
        &self,
        date: NaiveDate,
        records: &[HolderRecord],
    ) -> Result<u64, StoreError> {
        if self.fail_holder_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("holder writes disabled".into()));
        }

        let mut inner = self.inner.lock().await;
        let day = inner.live.entry(date).or_default();

        let mut inserted = 0;
        for record in records {
            if !day.contains_key(&record.address) {
                day.insert(record.address.clone(), record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn load_holders(&self, date: NaiveDate) -> Result<Vec<HolderRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let mut holders: Vec<HolderRecord> = inner
            .live
            .get(&date)
            .map(|day| day.values().cloned().collect())
            .unwrap_or_default();

        holders.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.address.cmp(&b.address)));
        Ok(holders)
    }

    async fn replace_leagues(
        &self,
        date: NaiveDate,
        buckets: &[LeagueBucket],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let rows = buckets
            .iter()
            .map(|b| (b.league, LeagueBucket { snapshot_date: date, ..b.clone() }))
            .collect();
        inner.leagues.insert(date, rows);
        Ok(())
    }

    async fn leagues_on_or_before(&self, date: NaiveDate) -> Result<Vec<LeagueBucket>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .leagues
            .range(..=date)
            .next_back()
            .map(|(_, rows)| rows.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_types::LastRecord;
    use rust_decimal_macros::dec;

    const JOB: &str = "holders";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn holder(n: u8, balance: rust_decimal::Decimal) -> HolderRecord {
        HolderRecord {
            address: format!("0x{}", format!("{:02x}", n).repeat(20)),
            is_contract: false,
            balance,
        }
    }

    #[tokio::test]
    async fn test_load_or_init_never_overwrites() {
        let store = MemoryStore::new();
        let state = store.load_or_init_progress(JOB, day(1)).await.unwrap();
        store
            .save_progress(
                JOB,
                day(1),
                state.version,
                &ProgressUpdate {
                    total_collected: Some(99),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let again = store.load_or_init_progress(JOB, day(1)).await.unwrap();
        assert_eq!(again.total_collected, 99);
        assert_eq!(again.version, 1);
    }

    #[tokio::test]
    async fn test_get_progress_does_not_create() {
        let store = MemoryStore::new();
        assert!(store.get_progress(JOB, day(1)).await.unwrap().is_none());
        assert!(store.get_progress(JOB, day(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let store = MemoryStore::new();
        let state = store.load_or_init_progress(JOB, day(1)).await.unwrap();

        let update = ProgressUpdate {
            last_page: Some(1),
            last_record: Some(LastRecord {
                address: "0xabc".into(),
                raw_value: "1".into(),
            }),
            ..Default::default()
        };
        store.save_progress(JOB, day(1), state.version, &update).await.unwrap();

        let stale = store.save_progress(JOB, day(1), state.version, &update).await;
        assert!(matches!(stale, Err(StoreError::Conflict { .. })));

        let current = store.get_progress(JOB, day(1)).await.unwrap().unwrap();
        assert_eq!(current.last_page, 1);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_begin_cycle_rotates_once() {
        let store = MemoryStore::new();
        store.seed_holders(day(1), &[holder(1, dec!(5)), holder(2, dec!(3))]).await;

        let state = store.load_or_init_progress(JOB, day(2)).await.unwrap();
        let claimed = store.begin_cycle(JOB, day(2), state.version).await.unwrap();
        assert_eq!(claimed.phase, JobPhase::Collecting);
        assert_eq!(store.rotation_count(), 1);
        assert_eq!(store.backup_len().await, 2);
        assert!(store.load_holders(day(1)).await.unwrap().is_empty());

        // A racing invocation that read the same version loses.
        let second = store.begin_cycle(JOB, day(2), state.version).await;
        assert!(matches!(second, Err(StoreError::Conflict { .. })));

        // Even with the fresh version, the phase is no longer NotStarted.
        let third = store.begin_cycle(JOB, day(2), claimed.version).await;
        assert!(matches!(third, Err(StoreError::Conflict { .. })));
        assert_eq!(store.rotation_count(), 1);
        assert_eq!(store.backup_len().await, 2);
    }

    #[tokio::test]
    async fn test_insert_skips_duplicates() {
        let store = MemoryStore::new();
        let a = holder(1, dec!(1));
        let b = holder(2, dec!(2));

        assert_eq!(store.insert_holders(day(1), &[a.clone(), b.clone()]).await.unwrap(), 2);
        assert_eq!(store.insert_holders(day(1), &[b, holder(3, dec!(3))]).await.unwrap(), 1);
        // Same address on another date is a different row.
        assert_eq!(store.insert_holders(day(2), &[a]).await.unwrap(), 1);

        let holders = store.load_holders(day(1)).await.unwrap();
        assert_eq!(holders.len(), 3);
        assert_eq!(holders[0].balance, dec!(3));
    }

    #[tokio::test]
    async fn test_insert_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_holder_writes(true);
        let result = store.insert_holders(day(1), &[holder(1, dec!(1))]).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_leagues_on_or_before_picks_latest() {
        let store = MemoryStore::new();
        let mut old = LeagueBucket::empty(League::Whale, day(1));
        old.user_holder_count = 10;
        let mut newer = LeagueBucket::empty(League::Whale, day(5));
        newer.user_holder_count = 20;

        store.replace_leagues(day(1), &[old]).await.unwrap();
        store.replace_leagues(day(5), &[newer]).await.unwrap();

        assert!(store.leagues_on_or_before(day(1) - chrono::Days::new(1)).await.unwrap().is_empty());
        assert_eq!(store.leagues_on_or_before(day(4)).await.unwrap()[0].user_holder_count, 10);
        assert_eq!(store.leagues_on_or_before(day(9)).await.unwrap()[0].user_holder_count, 20);
    }

    #[tokio::test]
    async fn test_replace_leagues_is_idempotent() {
        let store = MemoryStore::new();
        let buckets: Vec<LeagueBucket> =
            League::ALL.iter().map(|l| LeagueBucket::empty(*l, day(3))).collect();

        store.replace_leagues(day(3), &buckets).await.unwrap();
        store.replace_leagues(day(3), &buckets).await.unwrap();

        assert_eq!(store.leagues_on_or_before(day(3)).await.unwrap().len(), 10);
    }
}
