//! Authentication module
//!
//! Supports: IAM bearer token, `AuthSession` cookie, Basic
//!
//! The `CredentialResolver` derives all three from an account config. Each
//! derivation is independent, so a failure in one leaves the others intact.

mod resolver;
mod types;

pub use resolver::{
    find_session_cookie, CredentialResolver, DEFAULT_TOKEN_LIFETIME_SECS, IAM_APIKEY_GRANT_TYPE,
    IAM_TOKEN_URL, SESSION_COOKIE_NAME,
};
pub use types::{AuthMethod, BearerToken, Credentials};

#[cfg(test)]
mod tests;
