//! API request and response types.

use chrono::NaiveDate;
use hs_indexer::{CollectionSummary, CompletionSummary, RunOutcome};
use hs_types::{LeagueBucket, ProgressState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Query parameters for the league listing.
#[derive(Debug, Deserialize)]
pub struct LeaguesQuery {
    /// Snapshot date (`YYYY-MM-DD`). Defaults to today (UTC).
    pub date: Option<String>,
}

/// Body of a successful job invocation.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Outcome of the invocation, tagged by `status`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Collecting(CollectingBody),
    Complete(CompleteBody),
}

/// Collection is still in progress.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectingBody {
    pub pages_processed_this_run: u32,
    pub new_holders_this_run: u64,
    pub total_holders: u64,
    pub next_run_triggered: bool,
}

/// The day's snapshot has been classified.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
    pub total_supply: Decimal,
    pub total_holders: u64,
    pub user_holders: u64,
    pub contract_holders: u64,
    pub leagues_processed: usize,
}

impl From<CollectionSummary> for CollectingBody {
    fn from(summary: CollectionSummary) -> Self {
        Self {
            pages_processed_this_run: summary.pages_processed,
            new_holders_this_run: summary.new_holders,
            total_holders: summary.total_holders,
            next_run_triggered: summary.next_run_triggered,
        }
    }
}

impl From<CompletionSummary> for CompleteBody {
    fn from(summary: CompletionSummary) -> Self {
        Self {
            total_supply: summary.total_supply,
            total_holders: summary.total_holders,
            user_holders: summary.user_holders,
            contract_holders: summary.contract_holders,
            leagues_processed: summary.leagues_processed,
        }
    }
}

impl From<RunOutcome> for JobResponse {
    fn from(outcome: RunOutcome) -> Self {
        let status = match outcome {
            RunOutcome::Collecting(summary) => JobStatus::Collecting(summary.into()),
            RunOutcome::Complete(summary) => JobStatus::Complete(summary.into()),
        };
        Self {
            success: true,
            status,
        }
    }
}

/// One league row for the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueResponse {
    /// League identifier (e.g., "whale", "total").
    pub league: String,
    /// Lower bound in percent of supply. Absent for the total row.
    pub min_percentage: Option<Decimal>,
    /// Exclusive upper bound in percent of supply. Absent for the total row.
    pub max_percentage: Option<Decimal>,
    pub all_holder_count: u64,
    pub user_holder_count: u64,
    pub last_week_user_holder_count: u64,
    pub holder_count_delta: i64,
}

impl From<LeagueBucket> for LeagueResponse {
    fn from(bucket: LeagueBucket) -> Self {
        Self {
            league: bucket.league.id().to_string(),
            min_percentage: bucket.league.min_percentage(),
            max_percentage: bucket.league.max_percentage(),
            all_holder_count: bucket.all_holder_count,
            user_holder_count: bucket.user_holder_count,
            last_week_user_holder_count: bucket.last_week_user_holder_count,
            holder_count_delta: bucket.holder_count_delta,
        }
    }
}

/// League listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaguesResponse {
    pub success: bool,
    /// Date of the classification returned, if any exists.
    pub snapshot_date: Option<NaiveDate>,
    pub leagues: Vec<LeagueResponse>,
}

/// Today's progress row.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub progress: Option<ProgressState>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
