//! HTTP gateway for the problemset catalog.
//!
//! Serves the public catalog listing and the admin-only CRUD and credential
//! endpoints behind an ordered request gate (origin, CSRF, rate limit,
//! admin session) that also stamps security headers on every response.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use routes::create_router;
pub use state::AppState;
