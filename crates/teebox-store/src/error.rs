//! Error types for the persistence layer.

/// Errors from document reads, writes, and subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document exists at the given path.
    #[error("document {0} not found")]
    NotFound(String),

    /// A guarded write named a version the document has moved past.
    /// The caller should re-read and decide whether to retry.
    #[error("version conflict: expected {expected}, document is at {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// The backing service failed (network, permission, quota).
    #[error("store backend error: {0}")]
    Backend(String),

    /// The store has shut down and no longer serves requests.
    #[error("store is closed")]
    Closed,
}
