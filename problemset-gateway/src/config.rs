//! Gateway configuration read from the process environment.

use std::{fmt, str::FromStr, time::Duration};

use crate::{rate_limit::RateLimitConfig, session::SessionMode};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    /// Only one of the bootstrap admin variables is set.
    #[error("ADMIN_USERNAME and ADMIN_PASSWORD must be set together")]
    IncompleteBootstrap,
}

/// Admin credential created at start-up when absent.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Runtime configuration of the gateway.
#[derive(Clone)]
#[non_exhaustive]
pub struct GatewayConfig {
    /// Socket address to bind, e.g. `127.0.0.1:3000`.
    pub listen_addr: String,

    /// `memory://` or a file-backed `sqlite:` URL.
    pub database_url: String,

    /// Shared admin-session secret.
    pub admin_token: String,

    /// Shared CSRF secret expected in the `x-csrf-token` header.
    pub csrf_token: String,

    /// Origins allowed to call `/api/` routes.
    pub allowed_origins: Vec<String>,

    /// How session cookies are issued and verified.
    pub session_mode: SessionMode,

    /// Lifetime of signed session tokens.
    pub session_ttl: Duration,

    /// Honour `X-Forwarded-For` / `X-Real-IP` for the client address.
    pub trust_proxy: bool,

    pub rate_limit: RateLimitConfig,

    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl GatewayConfig {
    /// Create a config with the three required secrets and defaults elsewhere.
    #[must_use]
    pub fn new(
        database_url: impl Into<String>,
        admin_token: impl Into<String>,
        csrf_token: impl Into<String>,
    ) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            database_url: database_url.into(),
            admin_token: admin_token.into(),
            csrf_token: csrf_token.into(),
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_owned()],
            session_mode: SessionMode::Static,
            session_ttl: DEFAULT_SESSION_TTL,
            trust_proxy: false,
            rate_limit: RateLimitConfig::default(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            bootstrap_admin: None,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    /// See [`GatewayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] if `DATABASE_URL`, `ADMIN_TOKEN` or
    /// `CSRF_TOKEN` is absent, [`ConfigError::Invalid`] for unparsable values
    /// and [`ConfigError::IncompleteBootstrap`] if only half of the bootstrap
    /// admin pair is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let required = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let mut config = Self::new(
            required("DATABASE_URL")?,
            required("ADMIN_TOKEN")?,
            required("CSRF_TOKEN")?,
        );

        if let Some(addr) = get("PROBLEMSET_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_owned())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(mode) = get("SESSION_MODE") {
            config.session_mode = parse_var("SESSION_MODE", &mode)?;
        }
        if let Some(secs) = get("SESSION_TTL_SECS") {
            config.session_ttl = Duration::from_secs(parse_var("SESSION_TTL_SECS", &secs)?);
        }
        if let Some(flag) = get("TRUST_PROXY") {
            config.trust_proxy = parse_var("TRUST_PROXY", &flag)?;
        }
        if let Some(secs) = get("RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit.window = Duration::from_secs(parse_var("RATE_LIMIT_WINDOW_SECS", &secs)?);
        }
        if let Some(n) = get("RATE_LIMIT_MUTATING") {
            config.rate_limit.mutating_limit = parse_var("RATE_LIMIT_MUTATING", &n)?;
        }
        if let Some(n) = get("RATE_LIMIT_READ") {
            config.rate_limit.read_limit = parse_var("RATE_LIMIT_READ", &n)?;
        }
        if let Some(n) = get("RATE_LIMIT_MAX_KEYS") {
            config.rate_limit.max_keys = parse_var("RATE_LIMIT_MAX_KEYS", &n)?;
        }
        if let Some(cost) = get("BCRYPT_COST") {
            let cost: u32 = parse_var("BCRYPT_COST", &cost)?;
            if !(4..=31).contains(&cost) {
                return Err(ConfigError::Invalid {
                    var: "BCRYPT_COST",
                    reason: format!("{cost} is outside 4..=31"),
                });
            }
            config.bcrypt_cost = cost;
        }
        config.bootstrap_admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteBootstrap),
        };

        Ok(config)
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("'{raw}': {e}"),
    })
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("database_url", &self.database_url)
            .field("admin_token", &"<redacted>")
            .field("csrf_token", &"<redacted>")
            .field("allowed_origins", &self.allowed_origins)
            .field("session_mode", &self.session_mode)
            .field("session_ttl", &self.session_ttl)
            .field("trust_proxy", &self.trust_proxy)
            .field("rate_limit", &self.rate_limit)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}
