//! hs-server: Main binary for the holder league service.
//!
//! This binary wires together all crates and starts the HTTP server.

use anyhow::Context;
use hs_api::{create_router, AppState, JOB_PATH};
use hs_indexer::{ContinuationTrigger, DisabledTrigger, HolderPipeline, HttpContinuation, PipelineConfig};
use hs_ingestion::{BlockscoutSource, SourceConfig};
use hs_store::PgStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default port for the server.
const DEFAULT_PORT: u16 = 3000;

/// Default host for the server.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default size of the Postgres pool.
const DEFAULT_DB_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hs_server=info,hs_api=info,hs_indexer=info,hs_ingestion=info,hs_store=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse configuration from environment
    let source_config = SourceConfig::from_env()?;
    let mut pipeline_config = PipelineConfig::from_env()?;
    pipeline_config.decimals = source_config.decimals;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let cron_secret = std::env::var("CRON_SECRET").context("CRON_SECRET must be set")?;
    let db_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(DEFAULT_DB_CONNECTIONS);
    let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    tracing::info!(
        "Starting hs-server on {}:{} (token: {}, api: {}, target: {})",
        host,
        port,
        source_config.token_address,
        source_config.base_url,
        pipeline_config.target_holders
    );

    let store = PgStore::connect(&database_url, db_connections).await?;
    store.ensure_schema().await?;

    let source = BlockscoutSource::new(source_config)?;

    // Self-continuation needs to know where this service is reachable
    match std::env::var("SELF_URL") {
        Ok(self_url) if !self_url.trim().is_empty() => {
            let url = format!("{}{}", self_url.trim().trim_end_matches('/'), JOB_PATH);
            tracing::info!("Continuation target: {}", url);
            let trigger = HttpContinuation::new(url, cron_secret.clone());
            serve(source, store, trigger, pipeline_config, cron_secret, &host, port).await
        }
        _ => {
            tracing::warn!("SELF_URL not set; collection continues only on scheduled runs");
            serve(source, store, DisabledTrigger, pipeline_config, cron_secret, &host, port).await
        }
    }
}

async fn serve<C: ContinuationTrigger + 'static>(
    source: BlockscoutSource,
    store: PgStore,
    trigger: C,
    config: PipelineConfig,
    cron_secret: String,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let pipeline = HolderPipeline::new(source, store, trigger, config);

    // Create app state
    let state = Arc::new(AppState::new(pipeline, cron_secret));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                   - Health check");
    tracing::info!("  POST /v1/jobs/holder-snapshot  - Run one job invocation");
    tracing::info!("  GET  /v1/leagues               - League counts and deltas");
    tracing::info!("  GET  /v1/progress              - Today's collection progress");

    axum::serve(listener, app).await?;

    Ok(())
}
