//! Storage abstraction traits.
//!
//! Allows swapping between the in-memory and SQLite backends without
//! changing the HTTP handlers.

use async_trait::async_trait;
use problemset_core::{AdminCredential, Problem, ProblemDraft, ProblemId};

use crate::StoreError;

/// Catalog entry collection.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Return every entry in insertion order.
    ///
    /// # Errors
    /// Returns a backend error if the collection cannot be read.
    async fn list(&self) -> Result<Vec<Problem>, StoreError>;

    /// Insert a new entry and return it with its assigned id.
    ///
    /// The serial existence check and the insert are atomic.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateSerial`] if the serial collides.
    async fn insert(&self, draft: ProblemDraft) -> Result<Problem, StoreError>;

    /// Replace every non-id field of the entry `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::ProblemNotFound`] if `id` is unknown, or
    /// [`StoreError::DuplicateSerial`] if the new serial collides with a
    /// different entry.
    async fn replace(&self, id: &ProblemId, draft: ProblemDraft) -> Result<Problem, StoreError>;

    /// Delete the entry `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::ProblemNotFound`] if `id` is unknown.
    async fn delete(&self, id: &ProblemId) -> Result<(), StoreError>;
}

/// Admin credential collection.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for `username`.
    ///
    /// # Errors
    /// Returns a backend error if the collection cannot be read.
    async fn find_credential(&self, username: &str) -> Result<Option<AdminCredential>, StoreError>;

    /// Insert `credential` unless the username already exists.
    ///
    /// Returns `true` if the credential was created.
    ///
    /// # Errors
    /// Returns a backend error if the write fails.
    async fn create_credential(&self, credential: AdminCredential) -> Result<bool, StoreError>;

    /// Replace the stored hash for `username`.
    ///
    /// # Errors
    /// Returns [`StoreError::UserNotFound`] if `username` is unknown.
    async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), StoreError>;
}

/// A backend serving both collections.
#[async_trait]
pub trait Store: ProblemStore + CredentialStore {
    /// Short backend name for logs and the health probe.
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    /// Returns a backend error if a trivial round-trip fails.
    async fn health_check(&self) -> Result<(), StoreError>;
}
