//! HTTP client module
//!
//! Provides the single-shot HTTP transport shared by the credential resolver
//! and the database client.
//!
//! # Features
//!
//! - **Bounded Timeouts**: Every request carries a timeout (30s by default)
//! - **Form and JSON Bodies**: IAM and `_session` use form encoding
//! - **No Retries**: A failed call is reported once and left to the caller

mod client;

pub use client::{read_json, HttpClient, HttpClientConfig, RequestBody, RequestConfig};
