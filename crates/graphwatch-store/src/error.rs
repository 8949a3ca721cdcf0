//! Error types for store operations.

use thiserror::Error;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Why the store could not be reached.
        reason: String,
    },

    /// A store call exceeded its deadline.
    #[error("store operation timed out: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
    },

    /// The store returned data the caller could not interpret.
    #[error("invalid store data: {reason}")]
    InvalidData {
        /// Why the data was rejected.
        reason: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
