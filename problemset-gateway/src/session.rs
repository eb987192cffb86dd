//! Admin session cookies.
//!
//! In [`SessionMode::Static`] the cookie value is the configured admin secret
//! itself and verification is an exact (digest) comparison. In
//! [`SessionMode::Signed`] each login receives an HS256 token keyed by the
//! same secret and carrying an expiry.

use std::{fmt, str::FromStr, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin_token";

const COOKIE_ATTRIBUTES: &str = "HttpOnly; Secure; SameSite=Strict; Path=/";

/// How session tokens are issued and verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Every admin shares the configured secret as the cookie value.
    #[default]
    Static,
    /// Per-login signed tokens with an expiry.
    Signed,
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "signed" => Ok(Self::Signed),
            other => Err(format!("unknown session mode '{other}', expected static or signed")),
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Signed => "signed",
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies admin session tokens.
pub struct SessionManager {
    mode: SessionMode,
    secret: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("mode", &self.mode)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(mode: SessionMode, secret: &str, ttl: Duration) -> Self {
        Self {
            mode,
            secret: secret.to_owned(),
            ttl,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Produce the cookie value for a successful login by `username`.
    ///
    /// # Errors
    /// Returns the signing error in signed mode; static mode cannot fail.
    pub fn issue(&self, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
        match self.mode {
            SessionMode::Static => Ok(self.secret.clone()),
            SessionMode::Signed => {
                let now = chrono::Utc::now().timestamp();
                let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
                let claims = Claims {
                    sub: username.to_owned(),
                    iat: now,
                    exp: now.saturating_add(ttl),
                };
                jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            }
        }
    }

    /// Whether `token` grants admin access.
    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        match self.mode {
            SessionMode::Static => secrets_match(token, &self.secret),
            SessionMode::Signed => jsonwebtoken::decode::<Claims>(
                token,
                &self.decoding_key,
                &Validation::new(Algorithm::HS256),
            )
            .is_ok(),
        }
    }

    /// `Set-Cookie` value carrying `token`.
    #[must_use]
    pub fn set_cookie_header(&self, token: &str) -> String {
        match self.mode {
            SessionMode::Static => format!("{SESSION_COOKIE}={token}; {COOKIE_ATTRIBUTES}"),
            SessionMode::Signed => format!(
                "{SESSION_COOKIE}={token}; {COOKIE_ATTRIBUTES}; Max-Age={}",
                self.ttl.as_secs()
            ),
        }
    }

    /// `Set-Cookie` value that clears the session cookie.
    #[must_use]
    pub fn removal_cookie() -> String {
        format!("{SESSION_COOKIE}=; {COOKIE_ATTRIBUTES}; Max-Age=0")
    }
}

/// Compare two secrets through their SHA-256 digests so the comparison time
/// does not depend on the length of the common prefix.
pub(crate) fn secrets_match(given: &str, expected: &str) -> bool {
    Sha256::digest(given.as_bytes()) == Sha256::digest(expected.as_bytes())
}
