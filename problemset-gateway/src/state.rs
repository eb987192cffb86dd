//! Shared application state handed to every handler and middleware.

use std::sync::Arc;

use problemset_store::Store;

use crate::{
    config::GatewayConfig,
    gate::RequestGate,
    rate_limit::RateLimiter,
    session::SessionManager,
};

/// Cheap-to-clone handles built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub gate: Arc<RequestGate>,
    pub sessions: Arc<SessionManager>,
    pub limiter: Arc<RateLimiter>,
    pub trust_proxy: bool,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Wire the gate, limiter and session manager described by `config`
    /// around an opened `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &GatewayConfig) -> Self {
        let sessions = Arc::new(SessionManager::new(
            config.session_mode,
            &config.admin_token,
            config.session_ttl,
        ));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        let gate = Arc::new(RequestGate::new(
            config.allowed_origins.clone(),
            config.csrf_token.clone(),
            Arc::clone(&limiter),
            Arc::clone(&sessions),
        ));
        Self {
            store,
            gate,
            sessions,
            limiter,
            trust_proxy: config.trust_proxy,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}
