//! `/api/admin-auth`: login, password change and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use problemset_core::{validate_new_password, AdminCredential};
use problemset_store::{CredentialStore, Store};
use serde::Deserialize;
use serde_json::json;

use super::{hash_password, verify_password};
use crate::{config::BootstrapAdmin, error::GatewayError, session::SessionManager, state::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordBody {
    pub username: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `POST /api/admin-auth`: exchange a username and password for a session
/// cookie.
///
/// # Errors
/// Returns [`GatewayError::BadRequest`] if a field is missing,
/// [`GatewayError::InvalidCredentials`] if the user is unknown or the
/// password does not match, and [`GatewayError::Internal`] if the stored
/// hash is malformed or the store fails.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(body) = payload?;
    let (Some(username), Some(password)) = (present(body.username), present(body.password)) else {
        return Err(GatewayError::BadRequest(
            "Username and password are required".to_owned(),
        ));
    };

    let credential = state
        .store
        .find_credential(&username)
        .await
        .map_err(|e| GatewayError::from_store("Database error", e))?;
    let Some(credential) = credential else {
        tracing::warn!(username = %username, "login for unknown user");
        return Err(GatewayError::InvalidCredentials);
    };
    if !verify_password(password, credential.password_hash, "Auth error").await? {
        tracing::warn!(username = %username, "login with wrong password");
        return Err(GatewayError::InvalidCredentials);
    }

    let token = state
        .sessions
        .issue(&username)
        .map_err(|e| GatewayError::internal("Auth error", e))?;
    tracing::info!(username = %username, mode = %state.sessions.mode(), "admin logged in");

    Ok((
        [(header::SET_COOKIE, state.sessions.set_cookie_header(&token))],
        Json(json!({"success": true})),
    )
        .into_response())
}

/// `PUT /api/admin-auth`: replace an admin's password after re-checking the
/// old one.
///
/// # Errors
/// Returns [`GatewayError::BadRequest`] if a field is missing,
/// [`GatewayError::UserNotFound`] if the username is unknown,
/// [`GatewayError::InvalidCredentials`] if `oldPassword` does not match and
/// [`GatewayError::Validation`] if `newPassword` is out of bounds.
pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let Json(body) = payload?;
    let (Some(username), Some(old_password), Some(new_password)) = (
        present(body.username),
        present(body.old_password),
        present(body.new_password),
    ) else {
        return Err(GatewayError::BadRequest(
            "username, oldPassword and newPassword are required".to_owned(),
        ));
    };

    let credential = state
        .store
        .find_credential(&username)
        .await
        .map_err(|e| GatewayError::from_store("Password update error", e))?
        .ok_or(GatewayError::UserNotFound)?;
    if !verify_password(old_password, credential.password_hash, "Password update error").await? {
        tracing::warn!(username = %username, "password change with wrong old password");
        return Err(GatewayError::InvalidCredentials);
    }
    validate_new_password(&new_password)?;

    let hash = hash_password(new_password, state.bcrypt_cost, "Password update error").await?;
    state
        .store
        .set_password_hash(&username, &hash)
        .await
        .map_err(|e| GatewayError::from_store("Password update error", e))?;
    tracing::info!(username = %username, "admin password updated");

    Ok(Json(json!({"success": true, "message": "Password updated successfully"})))
}

/// `DELETE /api/admin-auth`: clear the session cookie.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, SessionManager::removal_cookie())],
        Json(json!({"success": true, "message": "Logged out successfully"})),
    )
}

/// Create the configured admin credential unless the username exists.
///
/// Returns `true` if a credential was created.
///
/// # Errors
/// Returns [`GatewayError::Validation`] if the password is out of bounds, or
/// an internal error if hashing or the store fails.
pub async fn bootstrap_admin(
    store: &dyn Store,
    admin: &BootstrapAdmin,
    bcrypt_cost: u32,
) -> Result<bool, GatewayError> {
    let existing = store
        .find_credential(&admin.username)
        .await
        .map_err(|e| GatewayError::from_store("Database error", e))?;
    if existing.is_some() {
        return Ok(false);
    }
    validate_new_password(&admin.password)?;
    let hash = hash_password(admin.password.clone(), bcrypt_cost, "Auth error").await?;
    store
        .create_credential(AdminCredential::new(admin.username.clone(), hash))
        .await
        .map_err(|e| GatewayError::from_store("Database error", e))
}
