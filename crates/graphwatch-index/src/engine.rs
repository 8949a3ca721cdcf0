//! The engine seam.
//!
//! The lifecycle layer talks to the search engine through this narrow
//! capability set, so the in-memory engine can be swapped for an external
//! full-text library without touching the lifecycle.

use crate::document::TriggerDocument;
use crate::error::Result;
use crate::options::{SearchOptions, SearchResult};

/// Write/delete/count/search/close capability of a search engine.
///
/// Implementations are internally thread-safe: writes, deletes, and searches
/// may run concurrently.
pub trait SearchEngine: Send + Sync {
    /// Upserts each document by id in one batched transaction.
    ///
    /// `None` entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be applied.
    fn write(&self, documents: &[Option<TriggerDocument>]) -> Result<()>;

    /// Removes documents in one batched transaction; missing ids are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be applied.
    fn delete(&self, ids: &[String]) -> Result<()>;

    /// Number of indexed documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unavailable.
    fn count(&self) -> Result<usize>;

    /// Runs one search, returning the page of hits and the unpaginated total.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be executed.
    fn search(&self, options: &SearchOptions) -> Result<(Vec<SearchResult>, i64)>;

    /// Releases engine resources.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown fails.
    fn close(&self) -> Result<()>;
}
