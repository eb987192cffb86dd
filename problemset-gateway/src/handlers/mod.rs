//! Axum route handlers for the catalog and credential endpoints.

pub mod auth;
pub mod problems;

use crate::error::GatewayError;

/// Hash `password` with bcrypt on the blocking pool.
async fn hash_password(
    password: String,
    cost: u32,
    context: &'static str,
) -> Result<String, GatewayError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| GatewayError::internal(context, e))?
        .map_err(|e| GatewayError::internal(context, e))
}

/// Check `password` against a stored bcrypt hash on the blocking pool.
///
/// A malformed stored hash is an internal error, not a failed match.
async fn verify_password(
    password: String,
    hash: String,
    context: &'static str,
) -> Result<bool, GatewayError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| GatewayError::internal(context, e))?
        .map_err(|e| GatewayError::internal(context, e))
}
