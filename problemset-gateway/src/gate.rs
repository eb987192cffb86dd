//! Request-gating pipeline applied to every request before the handlers.
//!
//! Checks run in a fixed order and stop at the first failure:
//! origin allow-list, CSRF token, rate limit, admin session.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Instant,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{
    rate_limit::{extract_client_ip, RateKey, RateLimiter},
    session::{secrets_match, SessionManager, SESSION_COOKIE},
    state::AppState,
};

/// Header carrying the shared CSRF secret.
pub const CSRF_HEADER: &str = "x-csrf-token";

const API_PREFIX: &str = "/api/";

/// Protected path prefix a request falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathGroup {
    /// `/api/problems` and everything below it.
    Problems,
    /// `/api/admin-auth` and everything below it.
    AdminAuth,
}

impl PathGroup {
    const PREFIXES: [(&'static str, PathGroup); 2] = [
        ("/api/problems", PathGroup::Problems),
        ("/api/admin-auth", PathGroup::AdminAuth),
    ];

    /// Segment-aware prefix match: `/api/problems/summary` is in
    /// [`PathGroup::Problems`], `/api/problemset` is in no group.
    #[must_use]
    pub fn classify(path: &str) -> Option<PathGroup> {
        Self::PREFIXES.into_iter().find_map(|(prefix, group)| {
            let rest = path.strip_prefix(prefix)?;
            (rest.is_empty() || rest.starts_with('/')).then_some(group)
        })
    }
}

/// Which budget a method draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodClass {
    /// POST, PUT and DELETE.
    Mutating,
    Read,
}

impl MethodClass {
    #[must_use]
    pub fn of(method: &Method) -> MethodClass {
        if *method == Method::POST || *method == Method::PUT || *method == Method::DELETE {
            MethodClass::Mutating
        } else {
            MethodClass::Read
        }
    }
}

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GateRejection {
    #[error("CORS: Origin not allowed")]
    OriginNotAllowed,

    #[error("Invalid or missing CSRF token.")]
    CsrfInvalid,

    #[error("Too many requests, please try again later.")]
    RateLimited,

    #[error("Unauthorized: Admins only")]
    Unauthorized,
}

impl GateRejection {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            GateRejection::OriginNotAllowed | GateRejection::CsrfInvalid => StatusCode::FORBIDDEN,
            GateRejection::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GateRejection::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({"success": false, "message": self.to_string()})),
        )
            .into_response()
    }
}

/// The parts of a request the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    /// Raw `Origin` header bytes; compared byte-for-byte with the allow-list.
    pub origin: Option<&'a [u8]>,
    pub csrf_token: Option<&'a str>,
    pub session_token: Option<&'a str>,
    pub client_ip: IpAddr,
}

/// Ordered request checks sharing one rate limiter and session verifier.
#[derive(Debug)]
pub struct RequestGate {
    allowed_origins: Vec<String>,
    csrf_token: String,
    limiter: Arc<RateLimiter>,
    sessions: Arc<SessionManager>,
}

impl RequestGate {
    #[must_use]
    pub fn new(
        allowed_origins: Vec<String>,
        csrf_token: impl Into<String>,
        limiter: Arc<RateLimiter>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            allowed_origins,
            csrf_token: csrf_token.into(),
            limiter,
            sessions,
        }
    }

    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    /// Run every check against `request` at the current time.
    ///
    /// # Errors
    /// Returns the first [`GateRejection`] that applies.
    pub fn check(&self, request: &GateRequest<'_>) -> Result<(), GateRejection> {
        self.check_at(request, Instant::now())
    }

    /// Run every check against `request` as if it arrived at `now`.
    ///
    /// # Errors
    /// Returns the first [`GateRejection`] that applies.
    pub fn check_at(&self, request: &GateRequest<'_>, now: Instant) -> Result<(), GateRejection> {
        if request.path.starts_with(API_PREFIX) {
            if let Some(origin) = request.origin {
                if !self.allowed_origins.iter().any(|o| o.as_bytes() == origin) {
                    return Err(GateRejection::OriginNotAllowed);
                }
            }
        }

        let Some(group) = PathGroup::classify(request.path) else {
            return Ok(());
        };
        let class = MethodClass::of(request.method);

        if class == MethodClass::Mutating
            && !request
                .csrf_token
                .is_some_and(|token| secrets_match(token, &self.csrf_token))
        {
            return Err(GateRejection::CsrfInvalid);
        }

        let key = RateKey {
            ip: request.client_ip,
            group,
            class,
        };
        if !self.limiter.check_and_record(key, now).is_allowed() {
            return Err(GateRejection::RateLimited);
        }

        if group == PathGroup::Problems
            && class == MethodClass::Mutating
            && !request
                .session_token
                .is_some_and(|token| self.sessions.verify(token))
        {
            return Err(GateRejection::Unauthorized);
        }

        Ok(())
    }
}

/// Axum middleware running [`RequestGate::check`] on every request.
pub async fn gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let client_ip = extract_client_ip(
        headers,
        request.extensions().get::<ConnectInfo<SocketAddr>>(),
        state.trust_proxy,
    );
    let gate_request = GateRequest {
        method: request.method(),
        path: request.uri().path(),
        origin: headers.get(header::ORIGIN).map(HeaderValue::as_bytes),
        csrf_token: headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()),
        session_token: jar.get(SESSION_COOKIE).map(|c| c.value()),
        client_ip,
    };

    if let Err(rejection) = state.gate.check(&gate_request) {
        tracing::warn!(
            reason = %rejection,
            method = %gate_request.method,
            path = gate_request.path,
            ip = %client_ip,
            "request rejected"
        );
        return rejection.into_response();
    }

    next.run(request).await
}
