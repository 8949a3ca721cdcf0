//! Store interfaces consumed by the filter and the index.
//!
//! Implementors wrap a concrete key-value store; components hold them as
//! `Arc<dyn FilterStore>` / `Arc<dyn IndexStore>` so backends stay swappable.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MatchedMetric, TriggerCheck};

/// The slice of the store consumed by the metric filter.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Returns every registered pattern string.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get_patterns(&self) -> Result<Vec<String>>;

    /// Persists one batch of matched metrics, keyed by metric name.
    ///
    /// Delivery is at-most-once: the caller resets its buffer whether or not
    /// the write succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the batch is then lost.
    async fn save_metrics(&self, metrics: &HashMap<String, MatchedMetric>) -> Result<()>;

    /// Records that the filter is alive and still ingesting.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn update_metrics_heartbeat(&self) -> Result<()>;
}

/// The slice of the store consumed by the trigger search index.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Returns the ids of every trigger in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get_all_trigger_ids(&self) -> Result<Vec<String>>;

    /// Returns the latest check for each requested trigger id.
    ///
    /// The result has the same length and order as `ids`; `None` means the
    /// trigger was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get_trigger_checks(&self, ids: &[String]) -> Result<Vec<Option<TriggerCheck>>>;

    /// Returns the ids of triggers dirtied at or after `since` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn fetch_triggers_to_reindex(&self, since: i64) -> Result<Vec<String>>;

    /// Drops change-feed entries older than `before` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn remove_triggers_to_reindex(&self, before: i64) -> Result<()>;
}
