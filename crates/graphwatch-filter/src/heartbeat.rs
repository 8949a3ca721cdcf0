//! Ingestion heartbeat.
//!
//! Samples the `total_received` counter periodically and records a heartbeat
//! in the store only when it advanced. An idle filter must not appear alive.

use std::sync::Arc;
use std::time::Duration;

use graphwatch_store::FilterStore;
use graphwatch_telemetry::FilterMetrics;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Runs the heartbeat until `shutdown` is cancelled.
pub async fn run_heartbeat(
    store: Arc<dyn FilterStore>,
    metrics: FilterMetrics,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_seen = metrics.total_received.value();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                let current = metrics.total_received.value();                if current == last_seen {
                    continue;
                }
                match store.update_metrics_heartbeat().await {
                    Ok(()) => last_seen = current,
                    Err(err) => {
                        // Retried next tick; last_seen stays behind so the
                        // heartbeat is not silently skipped.
                        warn!(error = %err, "heartbeat update failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwatch_store::MemoryStore;

    #[tokio::test]
    async fn heartbeat_fires_only_when_counter_advances() {
        let store = Arc::new(MemoryStore::new());
        let metrics = FilterMetrics::new();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run_heartbeat(
            Arc::clone(&store) as Arc<dyn FilterStore>,
            metrics.clone(),
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        // Idle: no heartbeats.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.heartbeat_count(), 0);

        // Lines arrive: heartbeats resume.
        metrics.total_received.inc();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.heartbeat_count() >= 1);
        let after_advance = store.heartbeat_count();

        // Idle again: the count stops moving.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.heartbeat_count(), after_advance);

        shutdown.cancel();
        task.await.expect("heartbeat");
    }

    #[tokio::test]
    async fn failed_heartbeat_retries_next_tick() {
        let store = Arc::new(MemoryStore::new());
        let metrics = FilterMetrics::new();
        let shutdown = CancellationToken::new();
        store.set_failing(true);
        let task = tokio::spawn(run_heartbeat(
            Arc::clone(&store) as Arc<dyn FilterStore>,
            metrics.clone(),
            Duration::from_millis(10),
            shutdown.clone(),
        ));

        // Let the task capture its `last_seen` baseline before traffic arrives.
        tokio::time::sleep(Duration::from_millis(20)).await;
        metrics.total_received.inc();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.heartbeat_count(), 0);

        store.set_failing(false);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.heartbeat_count() >= 1);

        shutdown.cancel();
        task.await.expect("heartbeat");
    }
}
