//! High-throughput metric filter for dot-separated metric streams.
#![forbid(unsafe_code)]
//!
//! `graphwatch-filter` ingests a line-oriented metric firehose over TCP,
//! matches each metric name against a compiled trie of user-defined glob
//! patterns, de-duplicates samples by retention-rounded timestamp, and batches
//! the hits into the store.
//!
//! Data flow: TCP ⇒ [`parser`] ⇒ [`trie`] match ⇒ [`batcher`] ⇒ store. The
//! [`refresher`] rebuilds the trie from the store every second and publishes
//! it atomically; the [`heartbeat`] reports liveness only while lines keep
//! arriving.
//!
//! [`MetricFilter`] wires all of it together:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use graphwatch_filter::{FilterConfig, MetricFilter};
//! use graphwatch_store::MemoryStore;
//!
//! # async fn run() -> Result<(), graphwatch_filter::FilterError> {
//! let store = Arc::new(MemoryStore::new());
//! let filter = MetricFilter::start(FilterConfig::default(), store).await?;
//! // ... serve until asked to stop ...
//! filter.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod batcher;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod ingester;
pub mod matcher;
pub mod parser;
pub mod refresher;
pub mod retention;
pub mod service;
pub mod trie;

pub use config::FilterConfig;
pub use error::{FilterError, Result};
pub use matcher::MetricMatcher;
pub use parser::{ParsedMetric, parse_line};
pub use retention::RetentionTable;
pub use service::MetricFilter;
pub use trie::PatternTrie;
