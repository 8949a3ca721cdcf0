//! Matched-metric batcher.
//!
//! Single consumer of the ingester channel. Deduplicates samples whose
//! `(retention_timestamp, value)` pair repeats per metric name, accumulates
//! the rest into a buffer keyed by name, and flushes the buffer to the store
//! either when it reaches capacity or once per flush interval. Delivery is
//! at-most-once: a failed write is logged and the buffer resets anyway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use graphwatch_store::{FilterStore, MatchedMetric};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Last `(retention_timestamp, value)` observed per metric name.
#[derive(Debug, Default)]
struct DedupCache {
    seen: HashMap<String, (i64, u64)>,
}

impl DedupCache {
    /// Returns false when the sample repeats the cached pair for its name.
    ///
    /// Values are compared bitwise so NaN samples dedup like any other.
    fn accept(&mut self, metric: &MatchedMetric) -> bool {
        let pair = (metric.retention_timestamp, metric.value.to_bits());
        match self.seen.get(&metric.metric) {
            Some(cached) if *cached == pair => false,
            _ => {
                self.seen.insert(metric.metric.clone(), pair);
                true
            }
        }
    }
}

/// Consumes matched metrics until the input channel closes.
///
/// Emits one final flush of whatever remains on close.
pub async fn run_batcher(
    store: Arc<dyn FilterStore>,
    mut input: mpsc::Receiver<MatchedMetric>,
    cache_capacity: usize,
    flush_interval: Duration,
) {
    let mut buffer: HashMap<String, MatchedMetric> = HashMap::new();
    let mut dedup = DedupCache::default();
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = input.recv() => match received {
                Some(metric) => {
                    if !dedup.accept(&metric) {
                        continue;
                    }
                    buffer.insert(metric.metric.clone(), metric);
                    if buffer.len() >= cache_capacity {
                        flush(&store, &mut buffer).await;
                        ticker.reset();
                    }
                }
                None => {
                    flush(&store, &mut buffer).await;
                    debug!("ingester channel closed, batcher exiting");
                    return;
                }
            },
            _ = ticker.tick() => {
                flush(&store, &mut buffer).await;
            }
        }
    }
}

/// Writes the buffer as one store call; empty flushes are suppressed.
async fn flush(store: &Arc<dyn FilterStore>, buffer: &mut HashMap<String, MatchedMetric>) {
    if buffer.is_empty() {
        return;
    }
    if let Err(err) = store.save_metrics(buffer).await {
        warn!(error = %err, dropped = buffer.len(), "metric batch write failed");
    }
    buffer.clear();
}
