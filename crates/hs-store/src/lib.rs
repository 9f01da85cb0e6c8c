//! hs-store: Persistence for the holder league pipeline.
//!
//! The [`SnapshotStore`] trait covers the four logical tables:
//!
//! | Table                     | Contents                                   |
//! |---------------------------|--------------------------------------------|
//! | `holder_job_progress`     | One cursor row per job and date            |
//! | `holder_snapshots`        | Live holder set, one row per address/date  |
//! | `holder_snapshots_backup` | Previous cycle's holder set                |
//! | `holder_league_stats`     | One row per league and date                |
//!
//! Two implementations are provided:
//!
//! - [`PgStore`]: Postgres via `sqlx`
//! - [`MemoryStore`]: in-process, for tests and local runs
//!
//! # Concurrency
//!
//! Invocations are not serialized by a lock. Instead every progress write
//! is a compare-and-swap on the row's `version`, and the destructive daily
//! rotation is bundled with its `NotStarted -> Collecting` claim in a
//! single transaction. A stale writer gets [`StoreError::Conflict`].

mod error;
mod memory;
mod postgres;
mod schema;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use chrono::NaiveDate;
use hs_types::{HolderRecord, LeagueBucket, ProgressState, ProgressUpdate};

/// Persistence abstraction for the pipeline.
///
/// Uses native async syntax with `Send` futures so stores can be shared
/// behind an `Arc` in axum state.
pub trait SnapshotStore: Send + Sync {
    /// Read the progress row, or `None` if the job has not run on `date`.
    fn get_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<ProgressState>, StoreError>> + Send;

    /// Read the progress row, inserting a zeroed one if absent.
    ///
    /// An existing row is never overwritten.
    fn load_or_init_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<ProgressState, StoreError>> + Send;

    /// Apply the `Some` fields of `update` if the row is still at
    /// `expected_version`. Returns the row as written.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the version moved on; nothing is written.
    fn save_progress(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
        update: &ProgressUpdate,
    ) -> impl std::future::Future<Output = Result<ProgressState, StoreError>> + Send;

    /// Start the day's cycle: move `NotStarted -> Collecting`, copy the live
    /// snapshot into the backup table and truncate the live table, all
    /// atomically.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the row is not at `expected_version` or
    /// is no longer `NotStarted`. The rotation did not happen in that case.
    fn begin_cycle(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
    ) -> impl std::future::Future<Output = Result<ProgressState, StoreError>> + Send;

    /// Insert holders for `date`, skipping addresses already present.
    /// Returns the number of rows actually inserted.
    fn insert_holders(
        &self,
        date: NaiveDate,
        records: &[HolderRecord],
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Every live holder for `date`, largest balance first.
    fn load_holders(
        &self,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<HolderRecord>, StoreError>> + Send;

    /// Write the league rows for `date`, replacing any existing ones.
    ///
    /// Repeated or concurrent calls for the same date converge to one row
    /// per league.
    fn replace_leagues(
        &self,
        date: NaiveDate,
        buckets: &[LeagueBucket],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// League rows of the most recent classification on or before `date`,
    /// in league order. Empty if none exists.
    fn leagues_on_or_before(
        &self,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<LeagueBucket>, StoreError>> + Send;
}
