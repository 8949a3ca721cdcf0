//! Lightweight in-process telemetry for the Graphwatch core.
#![forbid(unsafe_code)]
//!
//! `graphwatch-telemetry` provides the atomic counters, meters, and timers that
//! the metric filter and the trigger search index thread through their hot
//! paths. Everything here is lock-free and cheap to clone: instruments share
//! their state through an [`Arc`], so a component can hand a counter to a
//! background task and keep reading it from the outside.
//!
//! # Example
//!
//! ```rust
//! use graphwatch_telemetry::FilterMetrics;
//!
//! let metrics = FilterMetrics::new();
//! metrics.total_received.inc();
//! metrics.total_received.add(41);
//! assert_eq!(metrics.total_received.value(), 42);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// A monotonically increasing counter.
///
/// Cloning a counter yields a handle to the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicI64>,
}

impl Counter {
    /// Creates a new counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by one.
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `n` to the counter.
    pub fn add(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A meter counts events; it is a counter with event-rate intent.
///
/// Graphwatch exports the raw count and leaves rate derivation to the scraper.
#[derive(Debug, Clone, Default)]
pub struct Meter {
    count: Counter,
}

impl Meter {
    /// Creates a new meter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one event.
    pub fn mark(&self) {
        self.count.inc();
    }

    /// Marks `n` events.
    pub fn mark_n(&self, n: i64) {
        self.count.add(n);
    }

    /// Returns the total number of marked events.
    #[must_use]
    pub fn count(&self) -> i64 {
        self.count.value()
    }
}

/// Shared summary state for timers and histograms.
#[derive(Debug, Default)]
struct SummaryInner {
    count: AtomicU64,
    sum: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl SummaryInner {
    fn record(&self, sample: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(sample, Ordering::Relaxed);
        self.min.fetch_min(sample, Ordering::Relaxed);
        self.max.fetch_max(sample, Ordering::Relaxed);
    }
}

/// Summary of recorded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    /// Number of recorded samples.
    pub count: u64,
    /// Sum of all samples.
    pub sum: u64,
    /// Smallest sample, zero when nothing was recorded.
    pub min: u64,
    /// Largest sample, zero when nothing was recorded.
    pub max: u64,
}

impl Summary {
    /// Mean of the recorded samples, zero when nothing was recorded.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Records durations of an operation, keeping count/sum/min/max in microseconds.
#[derive(Debug, Clone)]
pub struct Timer {
    inner: Arc<SummaryInner>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Creates an empty timer.
    #[must_use]
    pub fn new() -> Self {
        let inner = SummaryInner::default();
        inner.min.store(u64::MAX, Ordering::Relaxed);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Records one duration.
    pub fn record(&self, elapsed: Duration) {
        self.inner.record(elapsed.as_micros() as u64);
    }

    /// Returns a snapshot of the recorded durations, in microseconds.
    #[must_use]
    pub fn snapshot(&self) -> Summary {
        snapshot_of(&self.inner)
    }
}

/// Records integer samples, keeping count/sum/min/max.
#[derive(Debug, Clone)]
pub struct Histogram {
    inner: Arc<SummaryInner>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new() -> Self {
        let inner = SummaryInner::default();
        inner.min.store(u64::MAX, Ordering::Relaxed);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Records one sample.
    pub fn record(&self, sample: u64) {
        self.inner.record(sample);
    }

    /// Returns a snapshot of the recorded samples.
    #[must_use]
    pub fn snapshot(&self) -> Summary {
        snapshot_of(&self.inner)
    }
}

fn snapshot_of(inner: &SummaryInner) -> Summary {
    let count = inner.count.load(Ordering::Relaxed);
    let min = inner.min.load(Ordering::Relaxed);
    Summary {
        count,
        sum: inner.sum.load(Ordering::Relaxed),
        min: if count == 0 { 0 } else { min },
        max: inner.max.load(Ordering::Relaxed),
    }
}

/// Instrument bundle for the metric filter.
#[derive(Debug, Clone, Default)]
pub struct FilterMetrics {
    /// Every line received over TCP, parseable or not.
    pub total_received: Counter,
    /// Lines accepted into the pipeline: parsed and pattern-matched.
    pub valid_received: Counter,
    /// Valid metrics that matched at least one pattern.
    pub matched_received: Counter,
    /// Duration of each pattern trie rebuild.
    pub build_timer: Timer,
}

impl FilterMetrics {
    /// Creates a fresh bundle with all instruments at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Instrument bundle for the trigger search index.
#[derive(Debug, Clone, Default)]
pub struct IndexMetrics {
    /// Duration of each actualizer pass over the change-feed.
    pub actualize_timer: Timer,
    /// Number of documents written per fill batch.
    pub fill_batch_sizes: Histogram,
    /// Triggers deleted from the index because their check disappeared.
    pub deletions: Meter,
}

impl IndexMetrics {
    /// Creates a fresh bundle with all instruments at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
