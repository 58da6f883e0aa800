// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Cloudant CDK
//!
//! A minimal, Rust-native client for the IBM Cloudant document database.
//!
//! ## Features
//!
//! - **Three Auth Forms**: IAM bearer token, `AuthSession` cookie, Basic
//! - **Partial Resolution**: a failed credential never blocks the others
//! - **Database Lifecycle**: create, list, inspect, delete
//! - **Document CRUD**: insert, get, update, delete, bulk insert
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cloudant_cdk::{AccountConfig, CloudantClient, CredentialResolver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AccountConfig::from_file("conf.json")?;
//!
//!     // Derive whichever credentials the config allows
//!     let resolver = CredentialResolver::new()?;
//!     let credentials = resolver.resolve_all(&config).await;
//!
//!     // Talk to the instance with the preferred one
//!     let client = CloudantClient::new(credentials)?;
//!     client.create_database("orders", false).await?;
//!     let doc = client.get_document("orders", "order-1").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────────────┐
//! │  AccountConfig   │────▶│   CredentialResolver   │──▶ IAM /identity/token
//! │ apikey host user │     │ basic · bearer · cookie│──▶ <host>/_session
//! └──────────────────┘     └───────────┬────────────┘
//!                                      │ Credentials
//!                          ┌───────────▼────────────┐
//!                          │     CloudantClient     │──▶ <host>/{db}/{doc}
//!                          │ databases · documents  │
//!                          └────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the CDK
pub mod error;

/// Common types and type aliases
pub mod types;

/// Account configuration loading
pub mod config;

/// Credential derivation
pub mod auth;

/// HTTP transport
pub mod http;

/// Database and document API
pub mod database;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AuthMethod, BearerToken, CredentialResolver, Credentials};
pub use config::AccountConfig;
pub use database::CloudantClient;
pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
