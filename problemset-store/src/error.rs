//! Error types for the store crate.

use problemset_core::{ProblemId, SerialKey};

/// Errors that can occur during catalog and credential storage operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Another entry already uses a serial with the same key.
    #[error("an entry with serial {0} already exists")]
    DuplicateSerial(SerialKey),

    /// No entry has the given id.
    #[error("problem not found: {0}")]
    ProblemNotFound(ProblemId),

    /// No credential exists for the given username.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The database URL names no supported backend.
    #[error("unsupported database url '{0}': expected memory:// or sqlite:")]
    UnsupportedUrl(String),

    /// An in-memory SQLite URL was given where data must outlive a connection.
    #[error("in-memory sqlite url '{0}' would lose data when its connection is replaced; use memory:// instead")]
    InMemorySqlite(String),

    /// A stored row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Underlying database driver error.
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
