//! Account configuration
//!
//! The account record is the one handed out by the Cloudant service
//! credentials page. Only `apikey`, `host`, `username` and `password` take
//! part in authentication; the rest is carried along as metadata.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable holding the IAM API key
pub const ENV_APIKEY: &str = "CLOUDANT_APIKEY";
/// Environment variable holding the instance host
pub const ENV_HOST: &str = "CLOUDANT_HOST";
/// Environment variable holding the legacy username
pub const ENV_USERNAME: &str = "CLOUDANT_USERNAME";
/// Environment variable holding the legacy password
pub const ENV_PASSWORD: &str = "CLOUDANT_PASSWORD";

// ============================================================================
// Account Config
// ============================================================================

/// Static description of a Cloudant account
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Key exchanged for an IAM bearer token
    #[serde(default)]
    pub apikey: String,

    /// Hostname of the Cloudant instance
    #[serde(default)]
    pub host: String,

    /// Username for basic and cookie auth
    #[serde(default)]
    pub username: String,

    /// Password for basic and cookie auth
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub iam_apikey_description: Option<String>,

    #[serde(default)]
    pub iam_apikey_name: Option<String>,

    #[serde(default)]
    pub iam_role_crn: Option<String>,

    #[serde(default)]
    pub iam_serviceid_crn: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// URL with embedded basic auth credentials
    #[serde(default)]
    pub url: Option<String>,
}

impl AccountConfig {
    /// Create a config from the four fields used for authentication
    pub fn new(
        apikey: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            apikey: apikey.into(),
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Load a config file, JSON or YAML depending on the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Parse a JSON config
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a YAML config
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read the config from `CLOUDANT_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Self::new(
            lookup(ENV_APIKEY).unwrap_or_default(),
            lookup(ENV_HOST).unwrap_or_default(),
            lookup(ENV_USERNAME).unwrap_or_default(),
            lookup(ENV_PASSWORD).unwrap_or_default(),
        )
    }

    /// Base URL of the instance, or `None` when no host is configured
    ///
    /// A bare host gets an `https://` scheme. Hosts that already carry a
    /// scheme are kept as given.
    pub fn base_url(&self) -> Option<String> {
        base_url_for(&self.host)
    }

    /// Names of the authentication fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("apikey", &self.apikey),
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect()
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("apikey", &redact(&self.apikey))
            .field("password", &redact(&self.password))
            .field("iam_apikey_name", &self.iam_apikey_name)
            .finish_non_exhaustive()
    }
}

/// Build the instance base URL from a host
pub fn base_url_for(host: &str) -> Option<String> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        Some(host.to_string())
    } else {
        Some(format!("https://{host}"))
    }
}

/// True when the value is empty or whitespace only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn redact(value: &str) -> &'static str {
    if is_blank(value) {
        "<empty>"
    } else {
        "<redacted>"
    }
}
