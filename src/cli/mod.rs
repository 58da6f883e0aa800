//! CLI module
//!
//! Command-line interface over the credential resolver and database client.
//!
//! # Commands
//!
//! - `auth` - Resolve credentials and report which are available
//! - `session` - Show the current `_session` document
//! - `ping` - Test connection to the instance
//! - `db` - List, create, inspect and delete databases
//! - `doc` - Get, insert, update, delete and bulk insert documents

mod commands;
mod runner;

pub use commands::{Cli, Commands, DbCommands, DocCommands, DocumentInput, OutputFormat};
pub use runner::Runner;
