//! Error types for store operations.

use std::fmt;

/// Errors from occurrence store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or a scope could not be opened.
    Unavailable {
        /// Underlying failure description.
        reason: String,
    },
    /// The due-occurrence query failed.
    QueryFailed {
        /// Underlying failure description.
        reason: String,
    },
    /// Committing the staged batch failed; nothing was persisted.
    SaveFailed {
        /// Underlying failure description.
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::QueryFailed { reason } => write!(f, "due-occurrence query failed: {reason}"),
            Self::SaveFailed { reason } => write!(f, "failed to save staged batch: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
