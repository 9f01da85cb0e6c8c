//! Table definitions, applied idempotently at startup.

/// Statements run in order by [`PgStore::ensure_schema`](crate::PgStore::ensure_schema).
pub(crate) const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS holder_job_progress (
        job_name            TEXT        NOT NULL,
        snapshot_date       DATE        NOT NULL,
        last_page           INTEGER     NOT NULL DEFAULT 0,
        continuation_token  JSONB,
        total_collected     BIGINT      NOT NULL DEFAULT 0,
        is_complete         BOOLEAN     NOT NULL DEFAULT FALSE,
        phase               TEXT        NOT NULL DEFAULT 'NOT_STARTED',
        last_address        TEXT,
        last_raw_value      TEXT,
        version             BIGINT      NOT NULL DEFAULT 0,
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (job_name, snapshot_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holder_snapshots (
        address        TEXT    NOT NULL,
        snapshot_date  DATE    NOT NULL,
        is_contract    BOOLEAN NOT NULL,
        balance        NUMERIC NOT NULL,
        PRIMARY KEY (address, snapshot_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holder_snapshots_backup (
        address        TEXT    NOT NULL,
        snapshot_date  DATE    NOT NULL,
        is_contract    BOOLEAN NOT NULL,
        balance        NUMERIC NOT NULL,
        PRIMARY KEY (address, snapshot_date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holder_league_stats (
        league                       TEXT        NOT NULL,
        snapshot_date                DATE        NOT NULL,
        all_holder_count             BIGINT      NOT NULL,
        user_holder_count            BIGINT      NOT NULL,
        last_week_user_holder_count  BIGINT      NOT NULL,
        holder_count_delta           BIGINT      NOT NULL,
        created_at                   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (league, snapshot_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_holder_league_stats_date ON holder_league_stats (snapshot_date)",
];
