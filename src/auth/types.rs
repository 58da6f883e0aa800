//! Credential types
//!
//! These are the artifacts derived from an [`AccountConfig`](crate::config::AccountConfig).
//! Each one is an independent way to authenticate the same account.

use super::resolver::DEFAULT_TOKEN_LIFETIME_SECS;
use crate::config::is_blank;
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a request to the instance is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// `Authorization: Bearer <iam token>`
    Bearer,
    /// `Cookie: AuthSession=<value>`
    Cookie,
    /// `Authorization: Basic <base64(user:pass)>`
    Basic,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Bearer => write!(f, "bearer"),
            AuthMethod::Cookie => write!(f, "cookie"),
            AuthMethod::Basic => write!(f, "basic"),
        }
    }
}

/// IAM access token with its expiry
///
/// Nothing refreshes the token automatically; callers check
/// [`is_expired`](Self::is_expired) and resolve again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    /// Create a new bearer token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    ///
    /// Lifetimes outside chrono's range fall back to the default lifetime.
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let now = Utc::now();
        let expires_at = chrono::Duration::try_seconds(seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .or_else(|| {
                now.checked_add_signed(chrono::Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS))
            });
        Self { token, expires_at }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}

/// Authentication artifacts for one account
///
/// Any field may be empty. Partial resolution is the normal outcome.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Full `Authorization` header value, `Basic <base64(user:pass)>`
    pub basic_auth: String,
    /// Cookie header value, `AuthSession=<value>`
    pub session_cookie: String,
    /// IAM bearer token
    pub bearer: Option<BearerToken>,
    /// Instance base URL, e.g. `https://acct.cloudantnosqldb.appdomain.cloud`
    pub base_url: String,
}

impl Credentials {
    /// The bearer token, or an empty string when none was issued
    pub fn bearer_token(&self) -> &str {
        self.bearer.as_ref().map_or("", |b| b.token.as_str())
    }

    /// Whether the given method has a usable credential
    pub fn has(&self, method: AuthMethod) -> bool {
        match method {
            AuthMethod::Bearer => !is_blank(self.bearer_token()),
            AuthMethod::Cookie => !is_blank(&self.session_cookie),
            AuthMethod::Basic => !is_blank(&self.basic_auth),
        }
    }

    /// Methods with a usable credential, in order of preference
    pub fn available_methods(&self) -> Vec<AuthMethod> {
        [AuthMethod::Bearer, AuthMethod::Cookie, AuthMethod::Basic]
            .into_iter()
            .filter(|m| self.has(*m))
            .collect()
    }

    /// The preferred usable method: bearer, then cookie, then basic
    pub fn preferred_method(&self) -> Option<AuthMethod> {
        self.available_methods().into_iter().next()
    }

    /// True when nothing could be resolved
    pub fn is_empty(&self) -> bool {
        self.preferred_method().is_none()
    }

    /// Add the credential for `method` to a request
    pub fn apply(&self, req: RequestConfig, method: AuthMethod) -> Result<RequestConfig> {
        if !self.has(method) {
            return Err(Error::missing_input(format!("{method} credential")));
        }

        match method {
            AuthMethod::Bearer => {
                Ok(req.header("Authorization", format!("Bearer {}", self.bearer_token())))
            }
            AuthMethod::Cookie => Ok(req.header("Cookie", self.session_cookie.as_str())),
            AuthMethod::Basic => Ok(req.header("Authorization", self.basic_auth.as_str())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("basic_auth", &self.has(AuthMethod::Basic))
            .field("session_cookie", &self.has(AuthMethod::Cookie))
            .field("bearer", &self.has(AuthMethod::Bearer))
            .field(
                "bearer_expires_at",
                &self.bearer.as_ref().and_then(|b| b.expires_at),
            )
            .finish()
    }
}
