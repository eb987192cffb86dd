//! Sliding-window rate limiting keyed by client IP, path group and method
//! class.

use std::{
    collections::{HashMap, VecDeque},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{extract::ConnectInfo, http::HeaderMap};
use tokio::task::JoinHandle;

use crate::gate::{MethodClass, PathGroup};

/// How often the background task drops idle keys.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Budgets and bounds of the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    /// Requests per window for POST, PUT and DELETE.
    pub mutating_limit: usize,
    /// Requests per window for every other method.
    pub read_limit: usize,
    /// Maximum number of tracked keys.
    pub max_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            mutating_limit: 10,
            read_limit: 60,
            max_keys: 10_000,
        }
    }
}

/// One independent budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub ip: IpAddr,
    pub group: PathGroup,
    pub class: MethodClass,
}

/// Outcome of [`RateLimiter::check_and_record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// The key has used its budget for the current window.
    Limited,
    /// The key is new and the table is full of live keys.
    TableFull,
}

impl RateDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == RateDecision::Allowed
    }
}

/// Request timestamps per key within the last window.
///
/// The lock is a blocking mutex; no critical section awaits.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<RateKey, VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn limit_for(&self, class: MethodClass) -> usize {
        match class {
            MethodClass::Mutating => self.config.mutating_limit,
            MethodClass::Read => self.config.read_limit,
        }
    }

    /// Decide whether a request for `key` at `now` is within budget, and
    /// record it if so. Rejected requests are not recorded.
    pub fn check_and_record(&self, key: RateKey, now: Instant) -> RateDecision {
        let window = self.config.window;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if !entries.contains_key(&key) && entries.len() >= self.config.max_keys {
            purge_expired(&mut entries, now, window);
            if entries.len() >= self.config.max_keys {
                tracing::warn!(
                    max_keys = self.config.max_keys,
                    ip = %key.ip,
                    "rate limiter at capacity, rejecting new client"
                );
                return RateDecision::TableFull;
            }
        }

        let limit = self.limit_for(key.class);
        let hits = entries.entry(key).or_default();
        evict_expired(hits, now, window);
        if hits.len() >= limit {
            return RateDecision::Limited;
        }
        hits.push_back(now);
        RateDecision::Allowed
    }

    /// Drop expired timestamps and empty keys. Returns the number of keys
    /// removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        purge_expired(&mut entries, now, self.config.window);
        before - entries.len()
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn evict_expired(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while hits
        .front()
        .is_some_and(|first| now.saturating_duration_since(*first) >= window)
    {
        hits.pop_front();
    }
}

fn purge_expired(entries: &mut HashMap<RateKey, VecDeque<Instant>>, now: Instant, window: Duration) {
    entries.retain(|_, hits| {
        evict_expired(hits, now, window);
        !hits.is_empty()
    });
}

/// Spawn the periodic sweep of `limiter`.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.sweep(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, remaining = limiter.tracked_keys(), "rate limiter swept");
            }
        }
    })
}

/// Resolve the client address of a request.
///
/// Forwarding headers are only honoured when `trust_proxy` is set, and then
/// only the last `X-Forwarded-For` hop, which the trusted proxy appended.
/// Without a peer address the client is `127.0.0.1`.
#[must_use]
pub fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> IpAddr {
    if trust_proxy {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|xff| xff.split(',').next_back())
            .and_then(|hop| hop.trim().parse().ok())
        {
            return ip;
        }
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
        {
            return ip;
        }
    }

    connect_info.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |ConnectInfo(addr)| addr.ip())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn key(last_octet: u8, class: MethodClass) -> RateKey {
        RateKey {
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)),
            group: PathGroup::Problems,
            class,
        }
    }

    #[test]
    fn eleventh_mutating_request_in_window_is_limited() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let start = Instant::now();
        let k = key(1, MethodClass::Mutating);
        for i in 0..10 {
            assert!(
                limiter.check_and_record(k, start + Duration::from_secs(i)).is_allowed(),
                "request {i} should pass"
            );
        }
        assert_eq!(
            limiter.check_and_record(k, start + Duration::from_secs(10)),
            RateDecision::Limited
        );
    }

    #[test]
    fn budgets_are_independent_per_class_group_and_ip() {
        let config = RateLimitConfig {
            mutating_limit: 1,
            read_limit: 2,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config);
        let now = Instant::now();
        let write = key(1, MethodClass::Mutating);
        assert!(limiter.check_and_record(write, now).is_allowed());
        assert!(!limiter.check_and_record(write, now).is_allowed());

        assert!(limiter.check_and_record(key(1, MethodClass::Read), now).is_allowed());
        assert!(limiter.check_and_record(key(2, MethodClass::Mutating), now).is_allowed());

        let auth = RateKey {
            group: PathGroup::AdminAuth,
            ..write
        };
        assert!(limiter.check_and_record(auth, now).is_allowed());
    }

    #[test]
    fn window_slides_and_rejections_do_not_consume_budget() {
        let config = RateLimitConfig {
            mutating_limit: 2,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config);
        let start = Instant::now();
        let k = key(1, MethodClass::Mutating);
        assert!(limiter.check_and_record(k, start).is_allowed());
        assert!(limiter.check_and_record(k, start + Duration::from_secs(30)).is_allowed());
        for s in 31..40 {
            assert!(!limiter.check_and_record(k, start + Duration::from_secs(s)).is_allowed());
        }
        // the first hit has left the window; the rejected ones were never recorded
        assert!(limiter.check_and_record(k, start + Duration::from_secs(60)).is_allowed());
        assert!(!limiter.check_and_record(k, start + Duration::from_secs(61)).is_allowed());
        assert!(limiter.check_and_record(k, start + Duration::from_secs(90)).is_allowed());
    }

    #[test]
    fn full_table_purges_expired_keys_before_rejecting() {
        let config = RateLimitConfig {
            max_keys: 2,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config);
        let start = Instant::now();
        assert!(limiter.check_and_record(key(1, MethodClass::Read), start).is_allowed());
        assert!(limiter.check_and_record(key(2, MethodClass::Read), start).is_allowed());
        assert_eq!(
            limiter.check_and_record(key(3, MethodClass::Read), start),
            RateDecision::TableFull
        );
        // known keys keep working at capacity
        assert!(limiter.check_and_record(key(1, MethodClass::Read), start).is_allowed());

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_and_record(key(3, MethodClass::Read), later).is_allowed());
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn sweep_drops_idle_keys() {
        let limiter = RateLimiter::new(RateLimitConfig::default());
        let start = Instant::now();
        limiter.check_and_record(key(1, MethodClass::Read), start);
        limiter.check_and_record(key(2, MethodClass::Read), start + Duration::from_secs(50));
        assert_eq!(limiter.sweep(start + Duration::from_secs(70)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn forwarding_headers_require_trust_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.9.8.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("5.6.7.8"));
        let peer = ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 40_000)));

        assert_eq!(
            extract_client_ip(&headers, Some(&peer), false),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))
        );
        assert_eq!(
            extract_client_ip(&headers, Some(&peer), true),
            IpAddr::V4(Ipv4Addr::new(10, 9, 8, 7)),
            "last hop wins"
        );

        headers.remove("x-forwarded-for");
        assert_eq!(
            extract_client_ip(&headers, Some(&peer), true),
            IpAddr::V4(Ipv4Addr::new(5, 6, 7, 8))
        );
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), None, true),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }
}
