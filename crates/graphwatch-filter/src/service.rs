//! Filter service wiring.
//!
//! [`MetricFilter`] assembles the full ingestion pipeline — retention table,
//! matcher, TCP ingester, batcher, pattern refresher, heartbeat — and owns
//! its shutdown. Channels close in topological order: the ingester drains
//! its connections and drops the sender, which ends the batcher after one
//! final flush.

use std::sync::Arc;

use graphwatch_store::FilterStore;
use graphwatch_telemetry::FilterMetrics;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::batcher::run_batcher;
use crate::config::FilterConfig;
use crate::error::Result;
use crate::heartbeat::run_heartbeat;
use crate::ingester;
use crate::matcher::MetricMatcher;
use crate::refresher::{refresh_once, run_refresher};
use crate::retention::RetentionTable;

/// Capacity of the ingester → batcher channel.
const CHANNEL_CAPACITY: usize = 16_384;

/// A running metric filter.
pub struct MetricFilter {
    shutdown: CancellationToken,
    matcher: Arc<MetricMatcher>,
    ingester: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl MetricFilter {
    /// Starts the whole pipeline.
    ///
    /// Startup is fatal on: unreadable retention schema, unbindable listen
    /// address, or a failed initial pattern fetch.
    ///
    /// # Errors
    ///
    /// Returns the first fatal startup error.
    pub async fn start(config: FilterConfig, store: Arc<dyn FilterStore>) -> Result<Self> {
        let retention = Arc::new(RetentionTable::from_file(&config.retention_config_path)?);
        let metrics = FilterMetrics::new();
        let matcher = Arc::new(MetricMatcher::new(retention, metrics.clone()));

        refresh_once(&store, &matcher).await?;

        let listener = TcpListener::bind(&config.listen_address).await?;
        info!(addr = %config.listen_address, "metric filter starting");

        let shutdown = CancellationToken::new();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut workers = Vec::new();
        workers.push(tokio::spawn(run_batcher(
            Arc::clone(&store),
            rx,
            config.cache_capacity,
            config.flush_interval,
        )));
        workers.push(tokio::spawn(run_refresher(
            Arc::clone(&store),
            Arc::clone(&matcher),
            config.refresh_interval,
            shutdown.clone(),
        )));
        workers.push(tokio::spawn(run_heartbeat(
            Arc::clone(&store),
            metrics,
            config.heartbeat_interval,
            shutdown.clone(),
        )));

        let ingester = tokio::spawn(ingester::serve(
            listener,
            Arc::clone(&matcher),
            tx,
            shutdown.clone(),
        ));

        Ok(Self {
            shutdown,
            matcher,
            ingester,
            workers,
        })
    }

    /// Telemetry of the running filter.
    #[must_use]
    pub fn metrics(&self) -> &FilterMetrics {
        self.matcher.metrics()
    }

    /// Stops accepting, drains in-flight connections, flushes the batcher,
    /// and joins every worker.
    pub async fn stop(self) {
        self.shutdown.cancel();
        // The ingester drops the channel sender once its connections drain;
        // the batcher then performs its final flush and exits.
        let _ = self.ingester.await;
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("metric filter stopped");
    }
}
