//! The daily snapshot job.
//!
//! [`HolderPipeline::run`] performs one invocation: it loads the stored
//! progress for the date, advances the [`JobPhase`] state machine as far as
//! one invocation allows, and reports what happened.
//!
//! ```text
//! NotStarted   --begin_cycle-->  Collecting
//! Collecting   --page budget-->  Collecting (continuation scheduled)
//! Collecting   --target------->  TargetReached
//! Collecting   --end of data-->  Exhausted
//! TargetReached | Exhausted --> Classifying --> Done
//! ```
//!
//! Every transition is a version-checked write, so a second invocation
//! racing this one fails with a conflict instead of double-applying work.

use crate::config::PipelineConfig;
use crate::continuation::ContinuationTrigger;
use crate::converter::convert_holders;
use crate::delta::{apply_deltas, prior_week_cutoff};
use crate::error::IndexerError;
use crate::league::classify_holders;
use crate::writer::SnapshotWriter;
use chrono::NaiveDate;
use hs_ingestion::{fetch_page_with_retry, HolderSource, IngestionError, PageOutcome, TokenInfo};
use hs_store::SnapshotStore;
use hs_types::{
    scale_raw_amount, JobPhase, LastRecord, LeagueBucket, League, ProgressState, ProgressUpdate,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Result of a single invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    /// Collection stopped at the page budget and will continue.
    Collecting(CollectionSummary),

    /// The day's snapshot is classified.
    Complete(CompletionSummary),
}

impl RunOutcome {
    /// True once the cycle reached [`JobPhase::Done`].
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete(_))
    }
}

/// Work done by an invocation that ended mid-collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    /// Pages fetched by this invocation.
    pub pages_processed: u32,

    /// Holder rows inserted by this invocation.
    pub new_holders: u64,

    /// Holder rows collected today across all invocations.
    pub total_holders: u64,

    /// Whether a follow-up invocation was scheduled.
    pub next_run_triggered: bool,
}

/// Classification result for the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    /// Total supply in whole tokens, as used for percentages.
    pub total_supply: Decimal,

    /// Population-wide holder count.
    pub total_holders: u64,

    /// Population-wide non-contract holder count.
    pub user_holders: u64,

    /// Contracts found in the sample.
    pub contract_holders: u64,

    /// League rows written.
    pub leagues_processed: usize,

    /// Pages fetched by this invocation before classifying.
    pub pages_processed: u32,

    /// Holder rows inserted by this invocation before classifying.
    pub new_holders: u64,

    /// The rows written, in league order.
    pub leagues: Vec<LeagueBucket>,
}

/// Counters for the current invocation.
#[derive(Debug, Clone, Copy, Default)]
struct RunStats {
    pages: u32,
    new_holders: u64,
}

/// Orchestrates collection, classification and continuation for one job.
///
/// Generic over the data source, the store and the continuation trigger so
/// the whole state machine runs against in-memory doubles in tests.
pub struct HolderPipeline<S, St, C> {
    source: S,
    store: St,
    trigger: C,
    config: PipelineConfig,
    writer: SnapshotWriter,
}

impl<S, St, C> HolderPipeline<S, St, C>
where
    S: HolderSource,
    St: SnapshotStore,
    C: ContinuationTrigger,
{
    /// Assemble a pipeline.
    pub fn new(source: S, store: St, trigger: C, config: PipelineConfig) -> Self {
        let writer = SnapshotWriter::new(config.sub_batch_size, config.sub_batch_delay);
        Self {
            source,
            store,
            trigger,
            config,
            writer,
        }
    }

    /// The data source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The snapshot store.
    pub fn store(&self) -> &St {
        &self.store
    }

    /// The continuation trigger.
    pub fn trigger(&self) -> &C {
        &self.trigger
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stored progress for `date`, if the job has run that day.
    pub async fn progress(&self, date: NaiveDate) -> Result<Option<ProgressState>, IndexerError> {
        Ok(self.store.get_progress(&self.config.job_name, date).await?)
    }

    /// League rows of the latest classification on or before `date`.
    pub async fn leagues(&self, date: NaiveDate) -> Result<Vec<LeagueBucket>, IndexerError> {
        Ok(self.store.leagues_on_or_before(date).await?)
    }

    /// Run one invocation for `date`.
    ///
    /// # Errors
    ///
    /// Any fetch, write or classification failure aborts the invocation.
    /// Pages saved before the failure remain saved and the next invocation
    /// resumes after them.
    ///
    /// An invocation after [`JobPhase::Done`] fetches no pages but does
    /// re-read token info and the external holder count, then rewrites the
    /// day's league rows. Its summary and the stored rows therefore follow
    /// the latest external figures rather than those of the first
    /// classification.
    pub async fn run(&self, date: NaiveDate) -> Result<RunOutcome, IndexerError> {
        let job = self.config.job_name.as_str();
        let state = self.store.load_or_init_progress(job, date).await?;

        tracing::info!(
            "Loaded {} progress for {}: phase {}, page {}, {} holders",
            job,
            date,
            state.phase,
            state.last_page,
            state.total_collected
        );

        match state.phase {
            JobPhase::NotStarted => {
                let state = self.store.begin_cycle(job, date, state.version).await?;
                tracing::info!("Rotated previous snapshot to backup; collecting {} for {}", job, date);
                self.collect(state, date).await
            }
            JobPhase::Collecting => self.collect(state, date).await,
            JobPhase::TargetReached
            | JobPhase::Exhausted
            | JobPhase::Classifying
            | JobPhase::Done => self.classify(state, date, RunStats::default()).await,
        }
    }

    async fn collect(
        &self,
        mut state: ProgressState,
        date: NaiveDate,
    ) -> Result<RunOutcome, IndexerError> {
        let job = self.config.job_name.as_str();
        let mut stats = RunStats::default();
        let mut end_of_data = false;

        while stats.pages < self.config.max_pages_per_run
            && state.total_collected < self.config.target_holders
        {
            let cursor = state.next_page_params(self.config.page_size);
            let outcome =
                fetch_page_with_retry(&self.source, cursor.as_ref(), &self.config.retry).await?;

            let page = match outcome {
                PageOutcome::Page(page) => page,
                PageOutcome::EndOfData => {
                    end_of_data = true;
                    break;
                }
            };

            let records = convert_holders(&page.items, self.config.decimals);
            let inserted = self.writer.write_batch(&self.store, date, &records).await?;

            let last_record = page.items.last().map(|item| LastRecord {
                address: item.address.hash.clone(),
                raw_value: item.value.clone(),
            });
            let update = ProgressUpdate {
                last_page: Some(state.last_page + 1),
                continuation_token: Some(page.next_page_params.clone()),
                total_collected: Some(state.total_collected + inserted),
                phase: None,
                last_record,
            };
            state = self
                .store
                .save_progress(job, date, state.version, &update)
                .await?;

            stats.pages += 1;
            stats.new_holders += inserted;

            tracing::info!(
                "Page {}: {} items, {} inserted, {} total",
                state.last_page,
                page.items.len(),
                inserted,
                state.total_collected
            );

            if page.next_page_params.is_none() {
                end_of_data = true;
                break;
            }

            let more = stats.pages < self.config.max_pages_per_run
                && state.total_collected < self.config.target_holders;
            if more && !self.config.page_delay.is_zero() {
                tokio::time::sleep(self.config.page_delay).await;
            }
        }

        let target_reached = state.total_collected >= self.config.target_holders;
        if target_reached || end_of_data {
            let phase = if target_reached {
                JobPhase::TargetReached
            } else {
                JobPhase::Exhausted
            };
            state = self
                .store
                .save_progress(job, date, state.version, &ProgressUpdate::phase(phase))
                .await?;
            tracing::info!("Collection finished ({}) with {} holders", phase, state.total_collected);
            return self.classify(state, date, stats).await;
        }

        let next_run_triggered = self.trigger.schedule(self.config.continuation_delay);
        if !next_run_triggered {
            tracing::warn!("No continuation scheduled for {}; waiting for the next cron run", job);
        }

        Ok(RunOutcome::Collecting(CollectionSummary {
            pages_processed: stats.pages,
            new_holders: stats.new_holders,
            total_holders: state.total_collected,
            next_run_triggered,
        }))
    }

    async fn classify(
        &self,
        mut state: ProgressState,
        date: NaiveDate,
        stats: RunStats,
    ) -> Result<RunOutcome, IndexerError> {
        let job = self.config.job_name.as_str();

        if matches!(state.phase, JobPhase::TargetReached | JobPhase::Exhausted) {
            state = self
                .store
                .save_progress(job, date, state.version, &ProgressUpdate::phase(JobPhase::Classifying))
                .await?;
        }

        let (token_info, holder_count) =
            futures::join!(self.source.get_token_info(), self.source.get_holder_count());

        let total_supply = self.resolve_supply(token_info.as_ref());
        let total_holder_count = self.resolve_holder_count(holder_count, token_info.as_ref());

        let holders = self.store.load_holders(date).await?;
        let contract_holders = holders.iter().filter(|h| h.is_contract).count() as u64;

        let buckets = classify_holders(&holders, total_supply, total_holder_count, date)?;
        let prior = self
            .store
            .leagues_on_or_before(prior_week_cutoff(date))
            .await?;
        let buckets = apply_deltas(buckets, &prior);

        self.store.replace_leagues(date, &buckets).await?;
        self.store
            .save_progress(job, date, state.version, &ProgressUpdate::phase(JobPhase::Done))
            .await?;

        let (total_holders, user_holders) = buckets
            .iter()
            .find(|b| b.league == League::Total)
            .map(|b| (b.all_holder_count, b.user_holder_count))
            .unwrap_or((total_holder_count, 0));

        tracing::info!(
            "Classified {} sampled holders for {}: supply {}, {} total, {} users, {} contracts",
            holders.len(),
            date,
            total_supply,
            total_holders,
            user_holders,
            contract_holders
        );

        Ok(RunOutcome::Complete(CompletionSummary {
            total_supply,
            total_holders,
            user_holders,
            contract_holders,
            leagues_processed: buckets.len(),
            pages_processed: stats.pages,
            new_holders: stats.new_holders,
            leagues: buckets,
        }))
    }

    /// Total supply in whole tokens, or the configured fallback.
    fn resolve_supply(&self, info: Result<&TokenInfo, &IngestionError>) -> Decimal {
        let fallback = self.config.fallback_total_supply;

        let info = match info {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Token info unavailable ({}); using fallback supply {}", e, fallback);
                return fallback;
            }
        };

        let Some(raw) = info.total_supply.as_deref() else {
            tracing::warn!("Token info has no total supply; using fallback {}", fallback);
            return fallback;
        };

        // Balances were scaled with the configured decimals, so supply must be too
        let decimals = self.config.decimals;
        let reported = info.decimals.as_deref().and_then(|d| d.trim().parse::<u32>().ok());
        if let Some(reported) = reported.filter(|d| *d != decimals) {
            tracing::warn!(
                "Token reports {} decimals but {} are configured; scaling supply with {}",
                reported,
                decimals,
                decimals
            );
        }

        match scale_raw_amount(raw, decimals) {
            Ok(supply) if supply > Decimal::ZERO => supply,
            Ok(_) => {
                tracing::warn!("Reported total supply is zero; using fallback {}", fallback);
                fallback
            }
            Err(e) => {
                tracing::warn!("Unparseable total supply {} ({}); using fallback {}", raw, e, fallback);
                fallback
            }
        }
    }

    /// External holder count from the counters endpoint, then the token
    /// info, then the configured fallback.
    fn resolve_holder_count(
        &self,
        counters: Result<u64, IngestionError>,
        info: Result<&TokenInfo, &IngestionError>,
    ) -> u64 {
        match counters {
            Ok(count) if count > 0 => return count,
            Ok(_) => tracing::warn!("Counters endpoint reported zero holders"),
            Err(e) => tracing::warn!("Holder counters unavailable: {}", e),
        }

        if let Some(count) = info.ok().and_then(|i| i.holders_count).filter(|c| *c > 0) {
            return count;
        }

        let fallback = self.config.fallback_holder_count;
        tracing::warn!("Using fallback holder count {}", fallback);
        fallback
    }
}
