//! SQLite store backend.
//!
//! Serials are kept as their JSON encoding so numbers and strings round-trip
//! as given; a `UNIQUE` index on the canonical serial key enforces
//! uniqueness atomically.

use std::time::Duration;

use async_trait::async_trait;
use problemset_core::{AdminCredential, Difficulty, Problem, ProblemDraft, ProblemId, Serial};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::{
    store::{CredentialStore, ProblemStore, Store},
    StoreError,
};

mod migrate;

const SELECT_PROBLEM: &str =
    "SELECT id, serial, title, difficulty, topic, question_link, solution_link FROM problems";

/// Catalog and credentials in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url` and run migrations.
    ///
    /// An in-memory database lives only as long as its connection, so those
    /// URLs get one connection that is never reaped for idleness or age.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlx`] if the connection or migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(5));
        let options = if is_in_memory(database_url) {
            options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options.max_connections(5)
        };
        let pool = options.connect(database_url).await?;
        migrate::migrate(&pool).await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Whether `database_url` names a SQLite database that vanishes with its
/// connection.
#[must_use]
pub fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn encode_serial(serial: &Serial) -> Result<String, StoreError> {
    serde_json::to_string(serial).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode_problem(row: &sqlx::sqlite::SqliteRow) -> Result<Problem, StoreError> {
    let serial: String = row.try_get("serial")?;
    let difficulty: String = row.try_get("difficulty")?;
    Ok(Problem {
        id: ProblemId::new(row.try_get::<String, _>("id")?),
        serial: serde_json::from_str(&serial).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        title: row.try_get("title")?,
        difficulty: difficulty
            .parse::<Difficulty>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        topic: row.try_get("topic")?,
        question_link: row.try_get("question_link")?,
        solution_link: row.try_get("solution_link")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl ProblemStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        let rows = sqlx::query(&format!("{SELECT_PROBLEM} ORDER BY seq"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_problem).collect()
    }

    async fn insert(&self, draft: ProblemDraft) -> Result<Problem, StoreError> {
        let key = draft.serial_key();
        let problem = Problem::from_draft(ProblemId::generate(), draft);
        let res = sqlx::query(
            r"
            INSERT INTO problems (id, serial, serial_key, title, difficulty, topic, question_link, solution_link)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(problem.id.as_str())
        .bind(encode_serial(&problem.serial)?)
        .bind(key.as_str())
        .bind(&problem.title)
        .bind(problem.difficulty.as_str())
        .bind(&problem.topic)
        .bind(&problem.question_link)
        .bind(&problem.solution_link)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(problem),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateSerial(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, id: &ProblemId, draft: ProblemDraft) -> Result<Problem, StoreError> {
        let key = draft.serial_key();
        let problem = Problem::from_draft(id.clone(), draft);
        let res = sqlx::query(
            r"
            UPDATE problems
            SET serial = ?2, serial_key = ?3, title = ?4, difficulty = ?5, topic = ?6,
                question_link = ?7, solution_link = ?8
            WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .bind(encode_serial(&problem.serial)?)
        .bind(key.as_str())
        .bind(&problem.title)
        .bind(problem.difficulty.as_str())
        .bind(&problem.topic)
        .bind(&problem.question_link)
        .bind(&problem.solution_link)
        .execute(&self.pool)
        .await;

        match res {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::ProblemNotFound(id.clone())),
            Ok(_) => Ok(problem),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateSerial(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &ProblemId) -> Result<(), StoreError> {
        let done = sqlx::query("DELETE FROM problems WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::ProblemNotFound(id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_credential(&self, username: &str) -> Result<Option<AdminCredential>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT username, password_hash FROM admin_credentials WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(username, hash)| AdminCredential::new(username, hash)))
    }

    async fn create_credential(&self, credential: AdminCredential) -> Result<bool, StoreError> {
        let done = sqlx::query(
            "INSERT INTO admin_credentials (username, password_hash) VALUES (?1, ?2) ON CONFLICT(username) DO NOTHING",
        )
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn set_password_hash(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE admin_credentials SET password_hash = ?2 WHERE username = ?1")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(username.to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
