//! In-memory store backend.
//!
//! [`MemoryStore`] implements both [`FilterStore`] and [`IndexStore`] over
//! `parking_lot` maps. It backs the test suites and is good enough for local
//! development; it is not durable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{FilterStore, IndexStore};
use crate::types::{MatchedMetric, TriggerCheck};

/// Volatile store holding patterns, metrics, triggers, and the change-feed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Registered pattern strings.
    patterns: RwLock<Vec<String>>,
    /// Every batch written through `save_metrics`, in write order.
    saved_batches: RwLock<Vec<HashMap<String, MatchedMetric>>>,
    /// Number of heartbeat updates recorded.
    heartbeats: AtomicU64,
    /// Latest check per trigger id.
    triggers: RwLock<HashMap<String, TriggerCheck>>,
    /// Change-feed: trigger id to the newest timestamp it was dirtied at.
    reindex_feed: RwLock<HashMap<String, i64>>,
    /// When set, every store call fails with `StoreError::Unavailable`.
    fail: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registered pattern list.
    pub fn set_patterns(&self, patterns: Vec<String>) {
        *self.patterns.write() = patterns;
    }

    /// Inserts or updates a trigger check and marks it dirty at `ts`.
    pub fn upsert_trigger(&self, check: TriggerCheck, ts: i64) {
        let id = check.trigger.id.clone();
        self.triggers.write().insert(id.clone(), check);
        self.mark_dirty(&id, ts);
    }

    /// Removes a trigger and marks its id dirty at `ts`.
    ///
    /// The dirty mark is what tells the index actualizer to drop the document.
    pub fn remove_trigger(&self, id: &str, ts: i64) {
        self.triggers.write().remove(id);
        self.mark_dirty(id, ts);
    }

    /// Marks a trigger id dirty, keeping the newest timestamp per id.
    pub fn mark_dirty(&self, id: &str, ts: i64) {
        let mut feed = self.reindex_feed.write();
        let entry = feed.entry(id.to_string()).or_insert(ts);
        if *entry < ts {
            *entry = ts;
        }
    }

    /// Returns every metric batch written so far, in write order.
    #[must_use]
    pub fn saved_batches(&self) -> Vec<HashMap<String, MatchedMetric>> {
        self.saved_batches.read().clone()
    }

    /// Returns every saved metric flattened across batches.
    #[must_use]
    pub fn saved_metrics(&self) -> Vec<MatchedMetric> {
        self.saved_batches
            .read()
            .iter()
            .flat_map(|batch| batch.values().cloned())
            .collect()
    }

    /// Number of heartbeat updates recorded.
    #[must_use]
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeats.load(Ordering::Relaxed)
    }

    /// Number of entries currently in the change-feed.
    #[must_use]
    pub fn reindex_feed_len(&self) -> usize {
        self.reindex_feed.read().len()
    }

    /// Makes every subsequent store call fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self, operation: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: format!("injected failure in {operation}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FilterStore for MemoryStore {
    async fn get_patterns(&self) -> Result<Vec<String>> {
        self.check_available("get_patterns")?;
        Ok(self.patterns.read().clone())
    }

    async fn save_metrics(&self, metrics: &HashMap<String, MatchedMetric>) -> Result<()> {
        self.check_available("save_metrics")?;
        debug!(count = metrics.len(), "saving metric batch");
        self.saved_batches.write().push(metrics.clone());
        Ok(())
    }

    async fn update_metrics_heartbeat(&self) -> Result<()> {
        self.check_available("update_metrics_heartbeat")?;
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn get_all_trigger_ids(&self) -> Result<Vec<String>> {
        self.check_available("get_all_trigger_ids")?;
        let mut ids: Vec<String> = self.triggers.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_trigger_checks(&self, ids: &[String]) -> Result<Vec<Option<TriggerCheck>>> {
        self.check_available("get_trigger_checks")?;
        let triggers = self.triggers.read();
        Ok(ids.iter().map(|id| triggers.get(id).cloned()).collect())
    }

    async fn fetch_triggers_to_reindex(&self, since: i64) -> Result<Vec<String>> {
        self.check_available("fetch_triggers_to_reindex")?;
        let feed = self.reindex_feed.read();
        let mut dirty: Vec<(i64, String)> = feed
            .iter()
            .filter(|(_, ts)| **ts >= since)
            .map(|(id, ts)| (*ts, id.clone()))
            .collect();
        dirty.sort();
        Ok(dirty.into_iter().map(|(_, id)| id).collect())
    }

    async fn remove_triggers_to_reindex(&self, before: i64) -> Result<()> {
        self.check_available("remove_triggers_to_reindex")?;
        self.reindex_feed.write().retain(|_, ts| *ts >= before);
        Ok(())
    }
}
