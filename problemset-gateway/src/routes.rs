//! Router assembly for the problemset gateway.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use problemset_store::Store;
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    gate::{gate_middleware, CSRF_HEADER},
    handlers::{auth, problems},
    state::AppState,
};

pub const SERVICE_NAME: &str = "problemset-gateway";

/// Set on every response, overriding anything a handler wrote.
pub const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("content-security-policy", "default-src 'self'"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains; preload",
    ),
];

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router.
///
/// From the outside in: security headers, request tracing, the request
/// gate, CORS, then the handlers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.gate.allowed_origins());

    let mut router = Router::new()
        .route(
            "/api/problems",
            get(problems::list_problems)
                .post(problems::create_problem)
                .put(problems::update_problem)
                .delete(problems::delete_problem),
        )
        .route("/api/problems/summary", get(problems::problem_summary))
        .route(
            "/api/admin-auth",
            post(auth::login)
                .put(auth::change_password)
                .delete(auth::logout),
        )
        .route("/health", get(health))
        .layer(cors)
        .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }
    router
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "ignoring unusable allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
        .allow_credentials(true)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /health`: liveness probe including a store round-trip.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend_name();
    let (status, label) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, store = backend, "store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        status,
        Json(json!({
            "status": label,
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "store": backend,
        })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use problemset_store::MemoryStore;
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;

    fn test_state() -> AppState {
        let config = GatewayConfig::new("memory://", "admin-secret", "csrf-secret");
        AppState::new(Arc::new(MemoryStore::new()), &config)
    }

    #[tokio::test]
    async fn health_response_format_returns_ok_with_store_name() {
        let app = create_router(test_state());
        let req = match Request::builder().uri("/health").body(Body::empty()) {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::X_FRAME_OPTIONS).map(HeaderValue::as_bytes),
            Some(&b"DENY"[..])
        );

        let bytes = match axum::body::to_bytes(resp.into_body(), 1024).await {
            Ok(b) => b,
            Err(e) => panic!("failed to read body: {e}"),
        };
        let body: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        };
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_is_answered() {
        let app = create_router(test_state());
        let req = match Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/problems")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
        {
            Ok(r) => r,
            Err(e) => panic!("failed to build request: {e}"),
        };
        let resp = match app.oneshot(req).await {
            Ok(r) => r,
            Err(e) => panic!("handler error: {e}"),
        };
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .map(HeaderValue::as_bytes),
            Some(&b"http://localhost:3000"[..])
        );
    }
}
