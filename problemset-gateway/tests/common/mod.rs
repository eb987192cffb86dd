//! Test utilities

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use problemset_core::{AdminCredential, Problem, ProblemDraft, ProblemId};
use problemset_store::{CredentialStore, ProblemStore, Store, StoreError};
use serde_json::{json, Value};
use tower::ServiceExt;

pub use problemset_gateway::{
    config::{BootstrapAdmin, GatewayConfig},
    create_router,
    handlers::auth::bootstrap_admin,
    state::AppState,
};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const CSRF_TOKEN: &str = "test-csrf-token";
pub const ORIGIN: &str = "http://localhost:3000";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Router plus the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Test application on the in-memory store with generous rate limits.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

/// Test application whose config is adjusted by `tweak` before start-up.
pub async fn create_test_app_with(tweak: impl FnOnce(&mut GatewayConfig)) -> TestApp {
    let mut config = GatewayConfig::new("memory://", ADMIN_TOKEN, CSRF_TOKEN);
    config.bcrypt_cost = 4;
    config.rate_limit.mutating_limit = 1_000;
    config.rate_limit.read_limit = 1_000;
    config.bootstrap_admin = Some(BootstrapAdmin {
        username: ADMIN_USER.to_owned(),
        password: ADMIN_PASSWORD.to_owned(),
    });
    tweak(&mut config);

    let store = match problemset_store::open(&config.database_url).await {
        Ok(s) => s,
        Err(e) => panic!("failed to open store: {e}"),
    };
    if let Some(admin) = &config.bootstrap_admin {
        if let Err(e) = bootstrap_admin(&*store, admin, config.bcrypt_cost).await {
            panic!("failed to bootstrap admin: {e}");
        }
    }
    let state = AppState::new(store, &config);
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

/// Test application in front of an arbitrary store; no admin is bootstrapped.
pub fn create_test_app_on(store: Arc<dyn Store>) -> TestApp {
    let mut config = GatewayConfig::new("memory://", ADMIN_TOKEN, CSRF_TOKEN);
    config.bcrypt_cost = 4;
    let state = AppState::new(store, &config);
    TestApp {
        router: create_router(state.clone()),
        state,
    }
}

/// Driver text every [`FailingStore`] error carries.
pub const DRIVER_DETAIL: &str = "disk I/O error at page 42";

/// A store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

fn driver_failure() -> StoreError {
    StoreError::Corrupt(DRIVER_DETAIL.to_owned())
}

#[async_trait]
impl ProblemStore for FailingStore {
    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        Err(driver_failure())
    }

    async fn insert(&self, _draft: ProblemDraft) -> Result<Problem, StoreError> {
        Err(driver_failure())
    }

    async fn replace(&self, _id: &ProblemId, _draft: ProblemDraft) -> Result<Problem, StoreError> {
        Err(driver_failure())
    }

    async fn delete(&self, _id: &ProblemId) -> Result<(), StoreError> {
        Err(driver_failure())
    }
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn find_credential(&self, _username: &str) -> Result<Option<AdminCredential>, StoreError> {
        Err(driver_failure())
    }

    async fn create_credential(&self, _credential: AdminCredential) -> Result<bool, StoreError> {
        Err(driver_failure())
    }

    async fn set_password_hash(&self, _username: &str, _hash: &str) -> Result<(), StoreError> {
        Err(driver_failure())
    }
}

#[async_trait]
impl Store for FailingStore {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(driver_failure())
    }
}

/// Request without CSRF token or session cookie.
pub fn request(method: Method, uri: &str, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    match builder.body(body) {
        Ok(r) => r,
        Err(e) => panic!("failed to build request: {e}"),
    }
}

/// Request carrying the CSRF token but no session cookie.
pub fn csrf_request(method: Method, uri: &str, body: Option<&Value>) -> Request<Body> {
    let mut req = request(method, uri, body);
    req.headers_mut()
        .insert("x-csrf-token", header::HeaderValue::from_static(CSRF_TOKEN));
    req
}

/// Request carrying the CSRF token and the given session cookie value.
pub fn admin_request_with(
    method: Method,
    uri: &str,
    body: Option<&Value>,
    session: &str,
) -> Request<Body> {
    let mut req = csrf_request(method, uri, body);
    let cookie = match header::HeaderValue::from_str(&format!("admin_token={session}")) {
        Ok(v) => v,
        Err(e) => panic!("bad cookie value: {e}"),
    };
    req.headers_mut().insert(header::COOKIE, cookie);
    req
}

/// Request carrying the CSRF token and the static admin session cookie.
pub fn admin_request(method: Method, uri: &str, body: Option<&Value>) -> Request<Body> {
    admin_request_with(method, uri, body, ADMIN_TOKEN)
}

/// Attach a peer address as the server would for a real connection.
pub fn from_peer(mut req: Request<Body>, peer: SocketAddr) -> Request<Body> {
    req.extensions_mut().insert(ConnectInfo(peer));
    req
}

pub async fn send(app: &TestApp, req: Request<Body>) -> Response<Body> {
    match app.router.clone().oneshot(req).await {
        Ok(r) => r,
        Err(e) => panic!("router error: {e}"),
    }
}

/// Read a response body as JSON.
pub async fn response_body(response: Response<Body>) -> Value {
    let bytes = match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => panic!("failed to read body: {e}"),
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => panic!("invalid JSON body: {e}"),
    }
}

/// Value of the `Set-Cookie` header, if any.
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Token carried by an `admin_token=...; ...` cookie string.
pub fn cookie_token(cookie: &str) -> Option<&str> {
    cookie.split(';').next()?.trim().strip_prefix("admin_token=")
}

/// A valid catalog payload.
pub fn problem_body(serial: Value, title: &str) -> Value {
    json!({
        "serial": serial,
        "title": title,
        "difficulty": "Easy",
        "topic": "Array, Hash Table",
        "questionLink": "https://leetcode.com/problems/two-sum/",
        "solutionLink": "https://youtu.be/KLlXCFG5TnA",
    })
}

/// Create an entry as admin and return its id.
pub async fn create_problem(app: &TestApp, body: &Value) -> String {
    let resp = send(app, admin_request(Method::POST, "/api/problems", Some(body))).await;
    let status = resp.status();
    let json = response_body(resp).await;
    assert_eq!(status, 201, "create failed: {json}");
    match json["id"].as_str() {
        Some(id) => id.to_owned(),
        None => panic!("create response without id: {json}"),
    }
}

/// Entries currently listed by `GET /api/problems`.
pub async fn list_problems(app: &TestApp) -> Vec<Value> {
    let resp = send(app, request(Method::GET, "/api/problems", None)).await;
    assert_eq!(resp.status(), 200);
    let body = response_body(resp).await;
    match body["problems"].as_array() {
        Some(list) => list.clone(),
        None => panic!("list response without problems: {body}"),
    }
}
