//! Index lifecycle: fill, actualize, sweep, refill.
//!
//! [`SearchIndex`] owns the engine and keeps it consistent with the store:
//!
//! - **fill** — bulk-populates the index from every trigger id, in batches
//!   written with bounded parallelism
//! - **actualizer** — consumes the change-feed every second, reindexing
//!   dirtied triggers and deleting removed ones
//! - **sweeper** — trims old change-feed entries every minute
//! - **refiller** — rebuilds the index from scratch periodically; queries
//!   arriving meanwhile fail fast with [`IndexError::NotReady`]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Instant;

use futures::StreamExt;
use graphwatch_store::IndexStore;
use graphwatch_telemetry::IndexMetrics;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::IndexConfig;
use crate::document::TriggerDocument;
use crate::engine::SearchEngine;
use crate::error::{IndexError, Result};
use crate::options::{SearchOptions, SearchResult};

/// Id of the synthetic document written once to amortize first-batch cost.
const WARMUP_ID: &str = "graphwatch-index-warmup";

/// The trigger search index and its background maintenance.
pub struct SearchIndex {
    engine: Arc<dyn SearchEngine>,
    store: Arc<dyn IndexStore>,
    config: IndexConfig,
    metrics: IndexMetrics,
    /// Cleared during refills; queries fail fast while unset.
    ready: AtomicBool,
    /// Unix timestamp up to which the change-feed has been consumed.
    indexed_at: AtomicI64,
}

impl SearchIndex {
    /// Creates an index that is not yet filled.
    #[must_use]
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        store: Arc<dyn IndexStore>,
        config: IndexConfig,
    ) -> Self {
        Self {
            engine,
            store,
            config,
            metrics: IndexMetrics::new(),
            ready: AtomicBool::new(false),
            indexed_at: AtomicI64::new(0),
        }
    }

    /// Telemetry of the index.
    #[must_use]
    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    /// Whether queries are currently served.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// The change-feed watermark, unix seconds.
    #[must_use]
    pub fn indexed_at(&self) -> i64 {
        self.indexed_at.load(Ordering::SeqCst)
    }

    /// Runs one search against the engine.
    ///
    /// # Errors
    ///
    /// [`IndexError::NotReady`] while a fill or refill is in progress;
    /// engine errors otherwise.
    pub fn search_triggers(&self, options: &SearchOptions) -> Result<(Vec<SearchResult>, i64)> {
        if !self.is_ready() {
            return Err(IndexError::NotReady);
        }
        self.engine.search(options)
    }

    /// Performs the initial fill and spawns the background workers.
    ///
    /// # Errors
    ///
    /// A failed initial fill is fatal and is returned to the caller.
    pub async fn start(
        self: Arc<Self>,
        shutdown: &CancellationToken,
    ) -> Result<Vec<JoinHandle<()>>> {
        self.fill().await?;
        info!(documents = self.engine.count()?, "search index filled");

        let handles = vec![
            tokio::spawn(run_actualizer(Arc::clone(&self), shutdown.clone())),
            tokio::spawn(run_sweeper(Arc::clone(&self), shutdown.clone())),
            tokio::spawn(run_refiller(self, shutdown.clone())),
        ];
        Ok(handles)
    }

    /// Bulk-populates the index from the store.
    ///
    /// Sets the watermark to the fill start time before fetching ids, so
    /// changes racing the fill are re-examined by the actualizer. Marks the
    /// index ready on success.
    ///
    /// # Errors
    ///
    /// Returns the first store or engine error; the index stays not-ready.
    pub async fn fill(&self) -> Result<()> {
        self.indexed_at
            .store(chrono::Utc::now().timestamp(), Ordering::SeqCst);

        let ids = self.store.get_all_trigger_ids().await?;
        debug!(triggers = ids.len(), "index fill started");

        // One throwaway write amortizes first-batch setup cost.
        self.engine.write(&[Some(warmup_document())])?;
        self.engine.delete(&[WARMUP_ID.to_string()])?;

        let batches = ids
            .chunks(self.config.batch_size.max(1))
            .map(<[String]>::to_vec)
            .collect::<Vec<_>>();

        let mut stream = futures::stream::iter(batches.into_iter().map(|batch| {
            let store = Arc::clone(&self.store);
            let engine = Arc::clone(&self.engine);
            async move {
                let checks = store.get_trigger_checks(&batch).await?;
                let documents: Vec<Option<TriggerDocument>> = checks
                    .into_iter()
                    .map(|check| check.map(TriggerDocument::from))
                    .collect();
                engine.write(&documents)?;
                Ok::<usize, IndexError>(documents.len())
            }
        }))
        .buffer_unordered(self.config.fill_parallelism.max(1));

        while let Some(written) = stream.next().await {
            let written = written?;
            self.metrics.fill_batch_sizes.record(written as u64);
        }

        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stops serving queries and releases the engine.
    ///
    /// # Errors
    ///
    /// Returns the engine's close error.
    pub fn stop(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);
        self.engine.close()
    }

    /// Consumes the change-feed once and advances the watermark.
    ///
    /// # Errors
    ///
    /// Returns the first store or engine error; the watermark then stays
    /// behind and the next tick retries the same span.
    pub async fn actualize(&self) -> Result<()> {
        let started = Instant::now();
        let now = chrono::Utc::now().timestamp();
        let watermark = self.indexed_at.load(Ordering::SeqCst);

        let ids = self.store.fetch_triggers_to_reindex(watermark).await?;
        if !ids.is_empty() {
            let checks = self.store.get_trigger_checks(&ids).await?;
            let mut deletions = Vec::new();
            let mut updates = Vec::new();
            for (id, check) in ids.iter().zip(checks) {
                match check {
                    None => deletions.push(id.clone()),
                    Some(check) => updates.push(Some(TriggerDocument::from(check))),
                }
            }
            if !deletions.is_empty() {
                self.engine.delete(&deletions)?;
                self.metrics.deletions.mark_n(deletions.len() as i64);
            }
            self.engine.write(&updates)?;
            debug!(
                reindexed = updates.len(),
                deleted = deletions.len(),
                "index actualized"
            );
        }

        self.indexed_at.store(now, Ordering::SeqCst);
        self.metrics.actualize_timer.record(started.elapsed());
        Ok(())
    }

    /// Drops change-feed entries older than the configured keep window.
    ///
    /// # Errors
    ///
    /// Returns the store error; the next tick retries.
    pub async fn sweep(&self) -> Result<()> {
        let keep = self.config.sweeper_keep.as_secs() as i64;
        let before = chrono::Utc::now().timestamp() - keep;
        self.store.remove_triggers_to_reindex(before).await?;
        Ok(())
    }

    /// Rebuilds the index from scratch.
    ///
    /// While the refill runs, the index is not ready and queries fail fast.
    ///
    /// # Errors
    ///
    /// Returns the first error; the index is marked ready again so queries
    /// are served from whatever state survived, and the failure is expected
    /// to be logged by the caller.
    pub async fn refill(&self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        let result = self.delete_all_and_fill().await;
        if result.is_err() {
            // Serve the partial state rather than blocking queries forever;
            // the next scheduled refill starts over.
            self.ready.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn delete_all_and_fill(&self) -> Result<()> {
        let (current, _) = self.engine.search(&SearchOptions {
            sort_by_id_only: true,
            ..SearchOptions::default()
        })?;
        let ids: Vec<String> = current.into_iter().map(|r| r.trigger_id).collect();
        for batch in ids.chunks(self.config.batch_size.max(1)) {
            self.engine.delete(batch)?;
        }
        self.fill().await
    }
}

/// Actualizer loop: one change-feed pass per tick.
async fn run_actualizer(index: Arc<SearchIndex>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(index.config.actualize_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let max_staleness = index.config.max_staleness.as_secs() as i64;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                if !index.is_ready() {
                    continue;
                }
                if let Err(err) = index.actualize().await {
                    let lag = chrono::Utc::now().timestamp() - index.indexed_at();
                    if lag > max_staleness {
                        error!(error = %err, lag_seconds = lag, "index is stale and actualization keeps failing");
                    } else {
                        warn!(error = %err, "index actualization failed");
                    }
                }
            }
        }
    }
}

/// Sweeper loop: trims the change-feed per tick.
async fn run_sweeper(index: Arc<SearchIndex>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(index.config.sweeper_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(err) = index.sweep().await {
                    warn!(error = %err, "change-feed sweep failed");
                }
            }
        }
    }
}

/// Refiller loop: full rebuild per tick.
async fn run_refiller(index: Arc<SearchIndex>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(index.config.refill_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; the initial fill already ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                info!("index refill started");
                match index.refill().await {
                    Ok(()) => info!("index refill finished"),
                    Err(err) => error!(error = %err, "index refill failed, previous documents kept where possible"),
                }
            }
        }
    }
}

fn warmup_document() -> TriggerDocument {
    TriggerDocument {
        id: WARMUP_ID.to_string(),
        name: "warm-up".to_string(),
        ..TriggerDocument::default()
    }
}
