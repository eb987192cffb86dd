//! Data-access layer for the problemset catalog.
//!
//! Exposes the [`ProblemStore`] and [`CredentialStore`] traits and two
//! backends: [`MemoryStore`] and [`SqliteStore`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{CredentialStore, ProblemStore, Store};

/// URL selecting the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

/// Open the backend named by `database_url`.
///
/// `memory://` selects [`MemoryStore`]; a file-backed `sqlite:` URL selects
/// [`SqliteStore`] and runs its migrations.
///
/// # Errors
/// Returns [`StoreError::InMemorySqlite`] for an in-memory SQLite URL,
/// [`StoreError::UnsupportedUrl`] for other schemes, or the backend's
/// connection error.
pub async fn open(database_url: &str) -> Result<Arc<dyn Store>, StoreError> {
    if database_url == MEMORY_URL {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if database_url.starts_with("sqlite:") {
        if sqlite::is_in_memory(database_url) {
            return Err(StoreError::InMemorySqlite(database_url.to_owned()));
        }
        let store = SqliteStore::connect(database_url).await?;
        tracing::info!("sqlite store ready");
        return Ok(Arc::new(store));
    }
    Err(StoreError::UnsupportedUrl(database_url.to_owned()))
}
