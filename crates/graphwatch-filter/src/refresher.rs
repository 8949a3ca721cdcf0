//! Periodic pattern refresher.
//!
//! Rebuilds the trie from the store's pattern list every tick and publishes
//! it through the matcher. A read error keeps the previous trie.

use std::sync::Arc;
use std::time::{Duration, Instant};

use graphwatch_store::FilterStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::matcher::MetricMatcher;
use crate::trie::PatternTrie;

/// Fetches patterns, rebuilds the trie, and publishes it once.
///
/// Used directly at startup, where a failure is fatal.
///
/// # Errors
///
/// Returns a store error if the pattern list cannot be read.
pub async fn refresh_once(store: &Arc<dyn FilterStore>, matcher: &MetricMatcher) -> Result<()> {
    let patterns = store.get_patterns().await?;
    let started = Instant::now();
    let trie = PatternTrie::new(&patterns);
    matcher.metrics().build_timer.record(started.elapsed());
    debug!(patterns = trie.pattern_count(), "pattern trie rebuilt");
    matcher.publish(trie);
    Ok(())
}

/// Refreshes the trie every `interval` until `shutdown` is cancelled.
///
/// Transient store errors are logged; the previous trie stays published.
pub async fn run_refresher(
    store: Arc<dyn FilterStore>,
    matcher: Arc<MetricMatcher>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                if let Err(err) = refresh_once(&store, &matcher).await {
                    warn!(error = %err, "pattern refresh failed, keeping previous trie");
                }
            }
        }
    }
}
