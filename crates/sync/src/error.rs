//! Error taxonomy for remote store operations.

use thiserror::Error;

/// Remote store operation, carried in errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Load the full collection.
    Fetch,
    /// Add or merge an item.
    Add,
    /// Replace an item's quantity.
    UpdateQuantity,
    /// Remove one item.
    Remove,
    /// Empty the collection.
    Clear,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Add => "add",
            Self::UpdateQuantity => "update-quantity",
            Self::Remove => "remove",
            Self::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// Errors from the HTTP layer of the store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{operation} returned status {status}")]
    Status {
        operation: Operation,
        status: reqwest::StatusCode,
    },

    /// The response body did not match the expected envelope.
    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by controller operations.
///
/// Unauthenticated calls are not errors - they settle as a skipped
/// [`SyncOutcome`](crate::controller::SyncOutcome).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Initial load failed; the local collection was reset to empty.
    #[error("failed to load collection: {0}")]
    Fetch(#[source] StoreError),

    /// A mutation failed; the optimistic update was rolled back.
    #[error("{operation} request failed: {source}")]
    Request {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}
