//! Glue between parser, retention table, and the current trie snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use graphwatch_store::MatchedMetric;
use graphwatch_telemetry::FilterMetrics;
use tracing::debug;

use crate::parser::parse_line;
use crate::retention::RetentionTable;
use crate::trie::PatternTrie;

/// Matches incoming metric lines against the published pattern trie.
///
/// The trie is published with a single atomic pointer store; every call to
/// [`MetricMatcher::process_line`] dereferences it once and works on that
/// snapshot, so a concurrent swap is never observed mid-match.
#[derive(Debug)]
pub struct MetricMatcher {
    trie: ArcSwap<PatternTrie>,
    retention: Arc<RetentionTable>,
    metrics: FilterMetrics,
}

impl MetricMatcher {
    /// Creates a matcher with an empty trie.
    #[must_use]
    pub fn new(retention: Arc<RetentionTable>, metrics: FilterMetrics) -> Self {
        Self {
            trie: ArcSwap::from_pointee(PatternTrie::default()),
            retention,
            metrics,
        }
    }

    /// Publishes a freshly built trie; in-flight matches keep their snapshot.
    pub fn publish(&self, trie: PatternTrie) {
        self.trie.store(Arc::new(trie));
    }

    /// Number of patterns in the currently published trie.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.trie.load().pattern_count()
    }

    /// Telemetry bundle shared with the rest of the filter.
    #[must_use]
    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    /// Processes one raw line: parse, match, fill retention.
    ///
    /// Counts every line in `total_received`. Parse failures are logged at
    /// debug and yield `None`; so do valid metrics that match no pattern.
    pub fn process_line(&self, line: &[u8], now: i64) -> Option<MatchedMetric> {
        self.metrics.total_received.inc();

        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "dropped unparsable line");
                return None;
            }
        };

        let trie = self.trie.load();
        let patterns = trie.match_metric(&parsed.name);
        if patterns.is_empty() {
            return None;
        }
        self.metrics.valid_received.inc();
        self.metrics.matched_received.inc();

        let retention = self.retention.retention(&parsed.name, now);
        Some(MatchedMetric::new(
            parsed.name,
            patterns,
            parsed.value,
            parsed.timestamp,
            retention,
        ))
    }
}
