//! Full-text trigger search index.
#![forbid(unsafe_code)]
//!
//! `graphwatch-index` keeps an in-memory inverted index over trigger
//! documents and answers boolean-composed searches: conjunctive tag filters,
//! fuzzy name/description terms, a problems-only score filter, and an author
//! filter, with `<mark>`-highlighted fragments in the results.
//!
//! The index is bulk-populated from the store at startup, kept fresh by an
//! actualizer consuming the store's change-feed, and periodically refilled
//! from scratch to bound memory growth. Queries arriving during a refill fail
//! fast with [`IndexError::NotReady`].
//!
//! ```rust
//! use graphwatch_index::{MemoryEngine, SearchEngine, SearchOptions, TriggerDocument};
//!
//! let engine = MemoryEngine::new();
//! engine.write(&[Some(TriggerDocument {
//!     id: "t1".into(),
//!     name: "CPU load".into(),
//!     desc: String::new(),
//!     tags: vec!["host".into()],
//!     created_by: String::new(),
//!     last_check_score: 1,
//! })]).unwrap();
//!
//! let (hits, total) = engine.search(&SearchOptions::default()).unwrap();
//! assert_eq!((hits.len(), total), (1, 1));
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod options;

pub use config::IndexConfig;
pub use document::TriggerDocument;
pub use engine::SearchEngine;
pub use error::{IndexError, Result};
pub use lifecycle::SearchIndex;
pub use memory::MemoryEngine;
pub use options::{SearchHighlight, SearchOptions, SearchResult};
