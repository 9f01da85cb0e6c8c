//! hs-indexer: Business logic for the holder league pipeline.
//!
//! This crate provides [`HolderPipeline`], which runs one invocation of the
//! daily holder-snapshot job against any [`HolderSource`] and
//! [`SnapshotStore`].
//!
//! # Overview
//!
//! Each invocation:
//! - Resumes from the stored progress cursor for today's date
//! - Fetches up to `max_pages_per_run` pages of holders, saving progress
//!   after every page
//! - Either schedules a continuation, or classifies the collected sample
//!   into leagues and records week-over-week deltas
//!
//! # Example
//!
//! ```rust,no_run
//! use hs_indexer::{DisabledTrigger, HolderPipeline, PipelineConfig, RunOutcome};
//! use hs_ingestion::{BlockscoutSource, SourceConfig};
//! use hs_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = BlockscoutSource::new(SourceConfig::from_env()?)?;
//!     let pipeline = HolderPipeline::new(
//!         source,
//!         MemoryStore::new(),
//!         DisabledTrigger,
//!         PipelineConfig::from_env()?,
//!     );
//!
//!     let today = chrono::Utc::now().date_naive();
//!     match pipeline.run(today).await? {
//!         RunOutcome::Collecting(s) => println!("{} holders so far", s.total_holders),
//!         RunOutcome::Complete(s) => println!("{} leagues written", s.leagues_processed),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
mod continuation;
mod converter;
mod delta;
mod error;
mod league;
mod pipeline;
mod writer;

pub use config::PipelineConfig;
pub use continuation::{ContinuationTrigger, DisabledTrigger, HttpContinuation, RecordingTrigger};
pub use converter::{convert_holder, convert_holders};
pub use delta::{apply_deltas, prior_week_cutoff, DELTA_WINDOW_DAYS};
pub use error::IndexerError;
pub use league::classify_holders;
pub use pipeline::{CollectionSummary, CompletionSummary, HolderPipeline, RunOutcome};
pub use writer::SnapshotWriter;

// Re-export commonly used types from dependencies for convenience
pub use hs_ingestion::{HolderSource, RetryPolicy};
pub use hs_store::SnapshotStore;
pub use hs_types::{JobPhase, League, LeagueBucket, ProgressState};
