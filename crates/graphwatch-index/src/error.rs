//! Error types for the trigger search index.

use graphwatch_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A query arrived while the index was being refilled.
    ///
    /// Callers are expected to retry after a short delay.
    #[error("search index is not ready")]
    NotReady,

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The search engine itself failed.
    #[error("search engine error: {reason}")]
    Engine {
        /// Why the engine operation failed.
        reason: String,
    },
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
