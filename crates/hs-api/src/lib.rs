//! hs-api: HTTP API layer for the holder league service
//!
//! This crate defines the REST API endpoints:
//! - GET|POST /v1/jobs/holder-snapshot (bearer auth)
//! - GET /v1/leagues
//! - GET /v1/progress (bearer auth)
//! - GET /health
//!
//! Handlers are generic over the pipeline's source, store and trigger, so
//! the same router serves production and in-memory test setups.

mod error;
mod handlers;
mod state;
mod types;

pub use error::ApiError;
pub use state::AppState;
pub use types::{
    CollectingBody, CompleteBody, HealthResponse, JobResponse, JobStatus, LeagueResponse,
    LeaguesQuery, LeaguesResponse, ProgressResponse,
};

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use hs_indexer::{ContinuationTrigger, HolderSource, SnapshotStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Path of the job endpoint, also the target of self-continuation.
pub const JOB_PATH: &str = "/v1/jobs/holder-snapshot";

/// Build the application router.
pub fn create_router<S, St, C>(state: Arc<AppState<S, St, C>>) -> Router
where
    S: HolderSource + 'static,
    St: SnapshotStore + 'static,
    C: ContinuationTrigger + 'static,
{
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            JOB_PATH,
            get(handlers::run_job::<S, St, C>).post(handlers::run_job::<S, St, C>),
        )
        .route("/v1/leagues", get(handlers::get_leagues::<S, St, C>))
        .route("/v1/progress", get(handlers::get_progress::<S, St, C>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
