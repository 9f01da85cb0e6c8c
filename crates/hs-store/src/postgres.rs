//! Postgres implementation of [`SnapshotStore`].
//!
//! Queries use `sqlx::query` (not the `query!` macro) so the crate builds
//! without a live database or offline query cache.

use crate::schema::STATEMENTS;
use crate::{SnapshotStore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use hs_types::{
    HolderRecord, JobPhase, LastRecord, League, LeagueBucket, PageParams, ProgressState,
    ProgressUpdate,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

const PROGRESS_COLUMNS: &str = "job_name, snapshot_date, last_page, continuation_token, \
     total_collected, is_complete, phase, last_address, last_raw_value, version, updated_at";

/// Store backed by a Postgres connection pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with a small pool.
    ///
    /// Each invocation is sequential, so a handful of connections is
    /// plenty.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready ({} statements)", STATEMENTS.len());
        Ok(())
    }

    async fn fetch_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> Result<Option<ProgressState>, StoreError> {
        let sql = format!(
            "SELECT {} FROM holder_job_progress WHERE job_name = $1 AND snapshot_date = $2",
            PROGRESS_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(job)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(progress_from_row).transpose()
    }
}

impl SnapshotStore for PgStore {
    async fn get_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> Result<Option<ProgressState>, StoreError> {
        self.fetch_progress(job, date).await
    }

    async fn load_or_init_progress(
        &self,
        job: &str,
        date: NaiveDate,
    ) -> Result<ProgressState, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO holder_job_progress (job_name, snapshot_date)
            VALUES ($1, $2)
            ON CONFLICT (job_name, snapshot_date) DO NOTHING
            "#,
        )
        .bind(job)
        .bind(date)
        .execute(&self.pool)
        .await?;

        self.fetch_progress(job, date)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("progress row for {} vanished", job)))
    }

    async fn save_progress(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
        update: &ProgressUpdate,
    ) -> Result<ProgressState, StoreError> {
        let last_page = update.last_page.map(i32::try_from).transpose().map_err(|_| {
            StoreError::Corrupt(format!("last_page out of range: {:?}", update.last_page))
        })?;
        let total = update.total_collected.map(to_i64).transpose()?;
        let token_present = update.continuation_token.is_some();
        let token = update
            .continuation_token
            .as_ref()
            .and_then(|t| t.as_ref().map(PageParams::to_value));

        let sql = format!(
            r#"
            UPDATE holder_job_progress SET
                last_page          = COALESCE($4, last_page),
                continuation_token = CASE WHEN $5 THEN $6 ELSE continuation_token END,
                total_collected    = COALESCE($7, total_collected),
                phase              = COALESCE($8, phase),
                is_complete        = COALESCE($9, is_complete),
                last_address       = COALESCE($10, last_address),
                last_raw_value     = COALESCE($11, last_raw_value),
                version            = version + 1,
                updated_at         = NOW()
            WHERE job_name = $1 AND snapshot_date = $2 AND version = $3
            RETURNING {}
            "#,
            PROGRESS_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(job)
            .bind(date)
            .bind(expected_version)
            .bind(last_page)
            .bind(token_present)
            .bind(token)
            .bind(total)
            .bind(update.phase.map(|p| p.as_str()))
            .bind(update.phase.map(|p| p.is_complete()))
            .bind(update.last_record.as_ref().map(|r| r.address.as_str()))
            .bind(update.last_record.as_ref().map(|r| r.raw_value.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => progress_from_row(&row),
            None => Err(StoreError::conflict(job, date)),
        }
    }

    async fn begin_cycle(
        &self,
        job: &str,
        date: NaiveDate,
        expected_version: i64,
    ) -> Result<ProgressState, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE holder_job_progress SET
                phase              = 'COLLECTING',
                last_page          = 0,
                continuation_token = NULL,
                total_collected    = 0,
                is_complete        = FALSE,
                last_address       = NULL,
                last_raw_value     = NULL,
                version            = version + 1,
                updated_at         = NOW()
            WHERE job_name = $1 AND snapshot_date = $2 AND version = $3
              AND phase = 'NOT_STARTED'
            RETURNING {}
            "#,
            PROGRESS_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(job)
            .bind(date)
            .bind(expected_version)
            .fetch_optional(&mut *tx)
            .await?;

        // Dropping `tx` without commit rolls back.
        let Some(row) = row else {
            return Err(StoreError::conflict(job, date));
        };
        let claimed = progress_from_row(&row)?;

        sqlx::query("DELETE FROM holder_snapshots_backup")
            .execute(&mut *tx)
            .await?;
        let backed_up = sqlx::query(
            r#"
            INSERT INTO holder_snapshots_backup (address, snapshot_date, is_contract, balance)
            SELECT address, snapshot_date, is_contract, balance FROM holder_snapshots
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();
        sqlx::query("TRUNCATE holder_snapshots")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Rotated snapshot for {} on {}: {} rows backed up",
            job,
            date,
            backed_up
        );
        Ok(claimed)
    }

    async fn insert_holders(
        &self,
        date: NaiveDate,
        records: &[HolderRecord],
    ) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let addresses: Vec<&str> = records.iter().map(|r| r.address.as_str()).collect();
        let contracts: Vec<bool> = records.iter().map(|r| r.is_contract).collect();
        let balances: Vec<Decimal> = records.iter().map(|r| r.balance).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO holder_snapshots (address, snapshot_date, is_contract, balance)
            SELECT t.address, $2, t.is_contract, t.balance
            FROM UNNEST($1::text[], $3::bool[], $4::numeric[]) AS t(address, is_contract, balance)
            ON CONFLICT (address, snapshot_date) DO NOTHING
            "#,
        )
        .bind(&addresses)
        .bind(date)
        .bind(&contracts)
        .bind(&balances)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn load_holders(&self, date: NaiveDate) -> Result<Vec<HolderRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT address, is_contract, balance
            FROM holder_snapshots
            WHERE snapshot_date = $1
            ORDER BY balance DESC, address
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<HolderRecord, StoreError> {
                Ok(HolderRecord {
                    address: row.try_get("address")?,
                    is_contract: row.try_get("is_contract")?,
                    balance: row.try_get("balance")?,
                })
            })
            .collect()
    }

    async fn replace_leagues(
        &self,
        date: NaiveDate,
        buckets: &[LeagueBucket],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM holder_league_stats WHERE snapshot_date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        for bucket in buckets {
            sqlx::query(
                r#"
                INSERT INTO holder_league_stats (
                    league, snapshot_date, all_holder_count, user_holder_count,
                    last_week_user_holder_count, holder_count_delta
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (league, snapshot_date) DO UPDATE SET
                    all_holder_count            = EXCLUDED.all_holder_count,
                    user_holder_count           = EXCLUDED.user_holder_count,
                    last_week_user_holder_count = EXCLUDED.last_week_user_holder_count,
                    holder_count_delta          = EXCLUDED.holder_count_delta,
                    created_at                  = NOW()
                "#,
            )
            .bind(bucket.league.id())
            .bind(date)
            .bind(to_i64(bucket.all_holder_count)?)
            .bind(to_i64(bucket.user_holder_count)?)
            .bind(to_i64(bucket.last_week_user_holder_count)?)
            .bind(bucket.holder_count_delta)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn leagues_on_or_before(&self, date: NaiveDate) -> Result<Vec<LeagueBucket>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT league, snapshot_date, all_holder_count, user_holder_count,
                   last_week_user_holder_count, holder_count_delta
            FROM holder_league_stats
            WHERE snapshot_date = (
                SELECT MAX(snapshot_date) FROM holder_league_stats WHERE snapshot_date <= $1
            )
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let mut buckets = rows
            .iter()
            .map(bucket_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        buckets.sort_by_key(|b| b.league);
        Ok(buckets)
    }
}

fn progress_from_row(row: &PgRow) -> Result<ProgressState, StoreError> {
    let last_page: i32 = row.try_get("last_page")?;
    let total: i64 = row.try_get("total_collected")?;
    let token: Option<serde_json::Value> = row.try_get("continuation_token")?;
    let phase: String = row.try_get("phase")?;
    let last_address: Option<String> = row.try_get("last_address")?;
    let last_raw_value: Option<String> = row.try_get("last_raw_value")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    let last_record = match (last_address, last_raw_value) {
        (Some(address), Some(raw_value)) => Some(LastRecord { address, raw_value }),
        _ => None,
    };

    Ok(ProgressState {
        job_name: row.try_get("job_name")?,
        snapshot_date: row.try_get("snapshot_date")?,
        last_page: u32::try_from(last_page)
            .map_err(|_| StoreError::Corrupt(format!("negative last_page {}", last_page)))?,
        continuation_token: token.and_then(PageParams::from_value),
        total_collected: u64::try_from(total)
            .map_err(|_| StoreError::Corrupt(format!("negative total_collected {}", total)))?,
        is_complete: row.try_get("is_complete")?,
        phase: JobPhase::parse(&phase)?,
        last_record,
        version: row.try_get("version")?,
        updated_at,
    })
}

fn bucket_from_row(row: &PgRow) -> Result<LeagueBucket, StoreError> {
    let league: String = row.try_get("league")?;
    Ok(LeagueBucket {
        league: League::from_id(&league)?,
        snapshot_date: row.try_get("snapshot_date")?,
        all_holder_count: to_u64(row.try_get("all_holder_count")?)?,
        user_holder_count: to_u64(row.try_get("user_holder_count")?)?,
        last_week_user_holder_count: to_u64(row.try_get("last_week_user_holder_count")?)?,
        holder_count_delta: row.try_get("holder_count_delta")?,
    })
}

fn to_i64(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("count out of range: {}", value)))
}

fn to_u64(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative count: {}", value)))
}
