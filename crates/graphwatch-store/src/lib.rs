//! Store interfaces and shared domain types for Graphwatch.
#![forbid(unsafe_code)]
//!
//! Durability in Graphwatch is delegated to an external key-value store. This
//! crate defines the narrow slices of that store consumed by the two core
//! subsystems:
//!
//! - [`FilterStore`] — what the metric filter needs: the registered pattern
//!   list, batched metric writes, and a liveness heartbeat.
//! - [`IndexStore`] — what the trigger search index needs: trigger ids, their
//!   latest check records, and the change-feed of dirtied trigger ids.
//!
//! It also carries the domain types that cross crate boundaries
//! ([`Trigger`], [`TriggerCheck`], [`MatchedMetric`]) and an in-memory store
//! ([`MemoryStore`]) used by tests and local development.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::{FilterStore, IndexStore};
pub use types::{MatchedMetric, Trigger, TriggerCheck, round_to_retention};
