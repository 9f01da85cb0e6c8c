//! Route handlers for the API endpoints.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use chrono::{NaiveDate, Utc};
use hs_indexer::{ContinuationTrigger, HolderSource, SnapshotStore};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{HealthResponse, JobResponse, LeaguesQuery, LeaguesResponse, ProgressResponse};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// GET /health - Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET|POST /v1/jobs/holder-snapshot - Run one invocation of the daily job.
///
/// Called by the scheduler and by the job's own continuation.
pub async fn run_job<S, St, C>(
    State(state): State<Arc<AppState<S, St, C>>>,
    headers: HeaderMap,
) -> Result<Json<JobResponse>, ApiError>
where
    S: HolderSource,
    St: SnapshotStore,
    C: ContinuationTrigger,
{
    state.authorize(&headers)?;

    let date = today();
    tracing::info!("Holder snapshot job invoked for {}", date);

    let outcome = state.pipeline.run(date).await?;
    Ok(Json(outcome.into()))
}

/// GET /v1/leagues - League rows of the latest classification on or before
/// `date` (default today).
pub async fn get_leagues<S, St, C>(
    State(state): State<Arc<AppState<S, St, C>>>,
    Query(query): Query<LeaguesQuery>,
) -> Result<Json<LeaguesResponse>, ApiError>
where
    S: HolderSource,
    St: SnapshotStore,
    C: ContinuationTrigger,
{
    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("date must be YYYY-MM-DD, got {}", raw)))?,
        None => today(),
    };

    let buckets = state.pipeline.leagues(date).await?;
    let snapshot_date = buckets.first().map(|b| b.snapshot_date);

    Ok(Json(LeaguesResponse {
        success: true,
        snapshot_date,
        leagues: buckets.into_iter().map(Into::into).collect(),
    }))
}

/// GET /v1/progress - Today's collection progress.
pub async fn get_progress<S, St, C>(
    State(state): State<Arc<AppState<S, St, C>>>,
    headers: HeaderMap,
) -> Result<Json<ProgressResponse>, ApiError>
where
    S: HolderSource,
    St: SnapshotStore,
    C: ContinuationTrigger,
{
    state.authorize(&headers)?;

    let progress = state.pipeline.progress(today()).await?;
    Ok(Json(ProgressResponse {
        success: true,
        progress,
    }))
}
