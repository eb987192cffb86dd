//! In-memory store backend.
//!
//! Keeps entries in insertion order. Used for tests, demos and
//! `DATABASE_URL=memory://`.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use problemset_core::{AdminCredential, Problem, ProblemDraft, ProblemId};
use tokio::sync::RwLock;

use crate::{
    store::{CredentialStore, ProblemStore, Store},
    StoreError,
};

/// Thread-safe in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    problems: RwLock<IndexMap<ProblemId, Problem>>,
    credentials: RwLock<HashMap<String, AdminCredential>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        Ok(self.problems.read().await.values().cloned().collect())
    }

    async fn insert(&self, draft: ProblemDraft) -> Result<Problem, StoreError> {
        let key = draft.serial_key();
        let mut problems = self.problems.write().await;
        if problems.values().any(|p| p.serial.key() == key) {
            return Err(StoreError::DuplicateSerial(key));
        }
        let problem = Problem::from_draft(ProblemId::generate(), draft);
        problems.insert(problem.id.clone(), problem.clone());
        Ok(problem)
    }

    async fn replace(&self, id: &ProblemId, draft: ProblemDraft) -> Result<Problem, StoreError> {
        let key = draft.serial_key();
        let mut problems = self.problems.write().await;
        if !problems.contains_key(id) {
            return Err(StoreError::ProblemNotFound(id.clone()));
        }
        if problems.values().any(|p| &p.id != id && p.serial.key() == key) {
            return Err(StoreError::DuplicateSerial(key));
        }
        let problem = Problem::from_draft(id.clone(), draft);
        problems.insert(id.clone(), problem.clone());
        Ok(problem)
    }

    async fn delete(&self, id: &ProblemId) -> Result<(), StoreError> {
        self.problems
            .write()
            .await
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::ProblemNotFound(id.clone()))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential(&self, username: &str) -> Result<Option<AdminCredential>, StoreError> {
        Ok(self.credentials.read().await.get(username).cloned())
    }

    async fn create_credential(&self, credential: AdminCredential) -> Result<bool, StoreError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.username) {
            return Ok(false);
        }
        credentials.insert(credential.username.clone(), credential);
        Ok(true)
    }

    async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut credentials = self.credentials.write().await;
        let credential = credentials
            .get_mut(username)
            .ok_or_else(|| StoreError::UserNotFound(username.to_owned()))?;
        password_hash.clone_into(&mut credential.password_hash);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
