use sqlx::SqlitePool;

use crate::StoreError;

/// Create the catalog and credential tables if they do not exist.
pub(crate) async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS problems (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            serial TEXT NOT NULL,
            serial_key TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            topic TEXT NOT NULL,
            question_link TEXT NOT NULL,
            solution_link TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS admin_credentials (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL
        );
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}
