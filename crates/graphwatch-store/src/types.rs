//! Domain types shared between the metric filter and the trigger index.
//!
//! This module provides:
//! - [`Trigger`] — the indexable projection of a user-defined alerting rule
//! - [`TriggerCheck`] — a trigger together with its latest evaluation score
//! - [`MatchedMetric`] — a parsed metric sample that matched at least one pattern
//! - [`round_to_retention`] — the timestamp rounding rule shared by filter and store

use serde::{Deserialize, Serialize};

/// The indexable projection of a user-defined alerting rule.
///
/// The full trigger definition (targets, thresholds, schedules) lives in the
/// store; only the fields that participate in search appear here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Opaque trigger identifier.
    pub id: String,
    /// Human-readable trigger name.
    pub name: String,
    /// Free-form description, empty when the author left none.
    #[serde(default)]
    pub desc: String,
    /// Tags attached to the trigger.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Login of the author, empty when the trigger has no author set.
    #[serde(default)]
    pub created_by: String,
}

/// A trigger together with the score of its most recent evaluation.
///
/// The score is nonzero while the trigger is in a non-OK state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCheck {
    /// The trigger being checked.
    pub trigger: Trigger,
    /// Score of the last check; zero means OK.
    pub score: i64,
}

/// Rounds `ts` to the nearest multiple of `retention`, halves rounding up.
///
/// `retention` must be positive.
#[must_use]
pub const fn round_to_retention(ts: i64, retention: i64) -> i64 {
    ((ts + retention / 2) / retention) * retention
}

/// A metric sample that matched at least one registered pattern.
///
/// Owned by the batcher from the moment of matching until it is handed to the
/// store in a flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedMetric {
    /// Full dot-separated metric name.
    pub metric: String,
    /// Patterns the name matched, as original pattern strings.
    pub patterns: Vec<String>,
    /// Sample value.
    pub value: f64,
    /// Timestamp exactly as received, unix seconds.
    pub timestamp: i64,
    /// Timestamp rounded to the metric's retention.
    pub retention_timestamp: i64,
    /// Retention of the metric, in seconds.
    pub retention: i64,
}

impl MatchedMetric {
    /// Creates a matched metric, filling the retention-rounded timestamp.
    #[must_use]
    pub fn new(
        metric: String,
        patterns: Vec<String>,
        value: f64,
        timestamp: i64,
        retention: i64,
    ) -> Self {
        Self {
            metric,
            patterns,
            value,
            timestamp,
            retention_timestamp: round_to_retention(timestamp, retention),
            retention,
        }
    }
}
