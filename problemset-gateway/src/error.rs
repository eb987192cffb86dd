//! Error types for the gateway crate.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use problemset_core::ValidationError;
use problemset_store::StoreError;
use serde_json::json;

/// Errors that can occur during gateway request handling.
///
/// The `Display` text of every variant is the `message` sent to the client,
/// so it never carries driver or library detail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The request body failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request is malformed.
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Problem not found")]
    ProblemNotFound,

    #[error("Entry with this serial already exists.")]
    DuplicateSerial,

    /// A storage or library failure; the cause was logged when this value
    /// was built.
    #[error("{0}")]
    Internal(&'static str),
}

impl GatewayError {
    /// Log `cause` and return an [`GatewayError::Internal`] carrying only
    /// the client-facing `context`.
    pub fn internal(context: &'static str, cause: impl fmt::Display) -> Self {
        tracing::error!(error = %cause, "{context}");
        Self::Internal(context)
    }

    /// Map a store error, keeping the conflict and not-found cases visible.
    pub fn from_store(context: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSerial(_) => Self::DuplicateSerial,
            StoreError::ProblemNotFound(_) => Self::ProblemNotFound,
            StoreError::UserNotFound(_) => Self::UserNotFound,
            other => Self::internal(context, other),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            GatewayError::UserNotFound | GatewayError::ProblemNotFound => StatusCode::NOT_FOUND,
            GatewayError::DuplicateSerial => StatusCode::CONFLICT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        GatewayError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        GatewayError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(json!({"success": false, "message": self.to_string()})),
        )
            .into_response()
    }
}
