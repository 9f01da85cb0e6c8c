//! Pipeline configuration.
//!
//! # Environment Variables
//!
//! | Variable                 | Default           |
//! |--------------------------|-------------------|
//! | `JOB_NAME`               | `holder-snapshot` |
//! | `TARGET_HOLDERS`         | 50000             |
//! | `MAX_PAGES_PER_RUN`      | 40                |
//! | `PAGE_SIZE`              | 50                |
//! | `PAGE_DELAY_MS`          | 250               |
//! | `SUB_BATCH_SIZE`         | 100               |
//! | `SUB_BATCH_DELAY_MS`     | 100               |
//! | `CONTINUATION_DELAY_MS`  | 2000              |
//! | `TOKEN_DECIMALS`         | 18                |
//! | `FALLBACK_TOTAL_SUPPLY`  | 1000000000        |
//! | `FALLBACK_HOLDER_COUNT`  | 60000             |
//! | `FETCH_MAX_ATTEMPTS`     | 5                 |
//! | `FETCH_RETRY_DELAY_MS`   | 1000              |
//! | `NOT_FOUND_LIMIT`        | 3                 |

use crate::error::IndexerError;
use hs_ingestion::RetryPolicy;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Settings for [`HolderPipeline`](crate::HolderPipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Logical job name, part of the progress row key.
    pub job_name: String,

    /// Holders to sample before classifying.
    pub target_holders: u64,

    /// Page ceiling for a single invocation.
    pub max_pages_per_run: u32,

    /// Items per API page; used to rebuild a lost cursor.
    pub page_size: u32,

    /// Pause between successful page fetches.
    pub page_delay: Duration,

    /// Rows per datastore write.
    pub sub_batch_size: usize,

    /// Pause between datastore writes.
    pub sub_batch_delay: Duration,

    /// Delay before the continuation call fires.
    pub continuation_delay: Duration,

    /// Token scale for raw balances.
    pub decimals: u32,

    /// Supply used when the token-info lookup fails.
    pub fallback_total_supply: Decimal,

    /// Holder count used when the counters lookup fails.
    pub fallback_holder_count: u64,

    /// Per-page retry policy.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            job_name: "holder-snapshot".to_string(),
            target_holders: 50_000,
            max_pages_per_run: 40,
            page_size: 50,
            page_delay: Duration::from_millis(250),
            sub_batch_size: 100,
            sub_batch_delay: Duration::from_millis(100),
            continuation_delay: Duration::from_millis(2000),
            decimals: 18,
            fallback_total_supply: Decimal::new(1_000_000_000, 0),
            fallback_holder_count: 60_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Drop every deliberate pause (tests and backfills).
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.sub_batch_delay = Duration::ZERO;
        self.continuation_delay = Duration::ZERO;
        self.retry.retry_delay = Duration::ZERO;
        self
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns [`IndexerError::Config`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, IndexerError> {
        let defaults = Self::default();

        Ok(Self {
            job_name: env::var("JOB_NAME").unwrap_or(defaults.job_name),
            target_holders: parse_var("TARGET_HOLDERS", defaults.target_holders)?,
            max_pages_per_run: parse_var("MAX_PAGES_PER_RUN", defaults.max_pages_per_run)?.max(1),
            page_size: parse_var("PAGE_SIZE", defaults.page_size)?.max(1),
            page_delay: parse_millis("PAGE_DELAY_MS", defaults.page_delay)?,
            sub_batch_size: parse_var("SUB_BATCH_SIZE", defaults.sub_batch_size)?.max(1),
            sub_batch_delay: parse_millis("SUB_BATCH_DELAY_MS", defaults.sub_batch_delay)?,
            continuation_delay: parse_millis("CONTINUATION_DELAY_MS", defaults.continuation_delay)?,
            decimals: parse_var("TOKEN_DECIMALS", defaults.decimals)?,
            fallback_total_supply: parse_var(
                "FALLBACK_TOTAL_SUPPLY",
                defaults.fallback_total_supply,
            )?,
            fallback_holder_count: parse_var(
                "FALLBACK_HOLDER_COUNT",
                defaults.fallback_holder_count,
            )?,
            retry: RetryPolicy {
                max_attempts: parse_var("FETCH_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
                retry_delay: parse_millis("FETCH_RETRY_DELAY_MS", defaults.retry.retry_delay)?,
                not_found_limit: parse_var("NOT_FOUND_LIMIT", defaults.retry.not_found_limit)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, IndexerError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("bad {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_millis(name: &str, default: Duration) -> Result<Duration, IndexerError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_var(name, default_ms).map(Duration::from_millis)
}
