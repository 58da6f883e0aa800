//! Credential resolver
//!
//! Derives the three credential forms Cloudant accepts from an
//! [`AccountConfig`]:
//! - Basic auth header, computed locally
//! - IAM bearer token, exchanged for the API key at the IAM token endpoint
//! - `AuthSession` cookie, issued by the instance's `_session` endpoint
//!
//! Every derivation comes in two shapes. The `try_*` methods return a tagged
//! [`Result`]; the plain methods log the failure and return an empty string.

use super::types::{AuthMethod, BearerToken, Credentials};
use crate::config::{is_blank, AccountConfig};
use crate::error::{Error, Result};
use crate::http::{read_json, HttpClient, RequestConfig};
use base64::Engine as _;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn, Instrument, Span};

/// IBM Cloud IAM token endpoint
pub const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Grant type for exchanging an API key
pub const IAM_APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Name of the Cloudant session cookie
pub const SESSION_COOKIE_NAME: &str = "AuthSession";

/// Lifetime assumed when IAM omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Resolves account credentials
///
/// The resolver holds no credential state. Each call performs at most one
/// HTTP request.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    http: HttpClient,
    iam_token_url: String,
    span: Span,
}

impl CredentialResolver {
    /// Create a resolver with a default HTTP client
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    /// Create a resolver with a custom HTTP client
    pub fn with_client(http: HttpClient) -> Self {
        Self {
            http,
            iam_token_url: IAM_TOKEN_URL.to_string(),
            span: Span::none(),
        }
    }

    /// Override the IAM token endpoint
    #[must_use]
    pub fn with_iam_url(mut self, url: impl Into<String>) -> Self {
        self.iam_token_url = url.into();
        self
    }

    /// Attach a span that every request made by this resolver is recorded under
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The IAM token endpoint in use
    pub fn iam_token_url(&self) -> &str {
        &self.iam_token_url
    }

    // ========================================================================
    // Basic auth
    // ========================================================================

    /// Build the `Authorization` value for basic auth
    pub fn try_derive_basic_auth(username: &str, password: &str) -> Result<String> {
        if is_blank(username) {
            return Err(Error::missing_input("username"));
        }
        if is_blank(password) {
            return Err(Error::missing_input("password"));
        }

        let raw = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
        Ok(format!("Basic {encoded}"))
    }

    /// Build the basic auth header value, or empty when either field is blank
    pub fn derive_basic_auth(username: &str, password: &str) -> String {
        Self::try_derive_basic_auth(username, password)
            .unwrap_or_else(|e| or_empty("derive_basic_auth", &e))
    }

    // ========================================================================
    // IAM bearer token
    // ========================================================================

    /// Exchange an API key for an IAM bearer token
    pub async fn try_fetch_bearer_token(&self, apikey: &str) -> Result<BearerToken> {
        if is_blank(apikey) {
            return Err(Error::missing_input("apikey"));
        }

        async {
            debug!("Requesting IAM token from {}", self.iam_token_url);
            let request = RequestConfig::new()
                .header("Accept", "application/json")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .form([("grant_type", IAM_APIKEY_GRANT_TYPE), ("apikey", apikey)]);

            let response = self
                .http
                .post_with_config(&self.iam_token_url, request)
                .await?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::upstream(status.as_u16(), body));
            }

            let token: IamTokenResponse = read_json(response).await?;
            token.into_bearer_token()
        }
        .instrument(self.span.clone())
        .await
    }

    /// Exchange an API key for an IAM bearer token, or empty on any failure
    pub async fn fetch_bearer_token(&self, apikey: &str) -> String {
        match self.try_fetch_bearer_token(apikey).await {
            Ok(token) => token.token,
            Err(e) => or_empty("fetch_bearer_token", &e),
        }
    }

    // ========================================================================
    // Session cookie
    // ========================================================================

    /// Open a session and return the cookie as `AuthSession=<value>`
    pub async fn try_fetch_session_cookie(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<String> {
        if is_blank(base_url) {
            return Err(Error::missing_input("host"));
        }
        if is_blank(username) {
            return Err(Error::missing_input("username"));
        }
        if is_blank(password) {
            return Err(Error::missing_input("password"));
        }

        async {
            let url = session_url(base_url);
            debug!("Opening session for {} at {}", username, url);
            let request = RequestConfig::new()
                .header("Accept", "application/json")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .form([("name", username), ("password", password)]);

            let response = self.http.post_with_config(&url, request).await?;

            let status = response.status();
            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::upstream(status.as_u16(), body));
            }

            let value = find_session_cookie(response.headers()).ok_or_else(|| {
                Error::malformed(format!("no {SESSION_COOKIE_NAME} cookie in response"))
            })?;
            debug!("Session cookie issued");
            Ok(format!("{SESSION_COOKIE_NAME}={value}"))
        }
        .instrument(self.span.clone())
        .await
    }

    /// Open a session and return the cookie, or empty on any failure
    pub async fn fetch_session_cookie(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> String {
        self.try_fetch_session_cookie(base_url, username, password)
            .await
            .unwrap_or_else(|e| or_empty("fetch_session_cookie", &e))
    }

    /// Fetch the session document for an already issued cookie
    pub async fn session_info(&self, credentials: &Credentials) -> Result<Value> {
        if is_blank(&credentials.base_url) {
            return Err(Error::missing_input("host"));
        }

        let request = credentials.apply(
            RequestConfig::new().header("Accept", "application/json"),
            AuthMethod::Cookie,
        )?;

        self.http
            .request_json(
                reqwest::Method::GET,
                &session_url(&credentials.base_url),
                request,
            )
            .instrument(self.span.clone())
            .await
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Derive every credential the config allows
    ///
    /// Never fails. Blank inputs are logged and the corresponding fields are
    /// left empty. The bearer token and the session cookie are fetched
    /// concurrently.
    pub async fn resolve_all(&self, config: &AccountConfig) -> Credentials {
        async {
            for field in config.missing_fields() {
                warn!("Account config field '{}' is blank", field);
            }

            let base_url = config.base_url();
            if base_url.is_none() {
                error!("Host not provided, session cookie cannot be requested");
            }

            let basic_auth = Self::derive_basic_auth(&config.username, &config.password);

            let cookie = async {
                match base_url.as_deref() {
                    Some(url) => {
                        self.fetch_session_cookie(url, &config.username, &config.password)
                            .await
                    }
                    None => String::new(),
                }
            };
            let bearer = async {
                match self.try_fetch_bearer_token(&config.apikey).await {
                    Ok(token) => Some(token),
                    Err(e) => {
                        or_empty("fetch_bearer_token", &e);
                        None
                    }
                }
            };

            let (bearer, session_cookie) = futures::join!(bearer, cookie);

            let credentials = Credentials {
                basic_auth,
                session_cookie,
                bearer,
                base_url: base_url.unwrap_or_default(),
            };
            debug!("Resolved credentials: {:?}", credentials);
            credentials
        }
        .instrument(self.span.clone())
        .await
    }
}

/// IAM token endpoint response
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl IamTokenResponse {
    fn into_bearer_token(self) -> Result<BearerToken> {
        let token = self
            .access_token
            .filter(|t| !is_blank(t))
            .ok_or_else(|| Error::malformed("IAM response has no access_token"))?;
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok(BearerToken::expires_in(token, lifetime))
    }
}

/// Find the `AuthSession` value among `Set-Cookie` headers
///
/// Only the `name=value` part before the first `;` is considered. The value
/// is returned without quotes or attributes.
pub fn find_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn session_url(base_url: &str) -> String {
    format!("{}/_session", base_url.trim_end_matches('/'))
}

fn or_empty(operation: &str, err: &Error) -> String {
    if err.is_missing_input() {
        warn!("{}: {}", operation, err);
    } else {
        error!("{}: {}", operation, err);
    }
    String::new()
}
