//! CLI commands and argument parsing

use crate::auth::AuthMethod;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cloudant command-line client
#[derive(Parser, Debug)]
#[command(name = "cloudant-cdk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Account config file (JSON or YAML). Falls back to CLOUDANT_* variables
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Credential to authenticate with (default: bearer, then cookie, then basic)
    #[arg(short, long, global = true)]
    pub auth: Option<AuthMethod>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve credentials and report which ones are available
    Auth,

    /// Show the current session document
    Session,

    /// Check that the instance is reachable
    Ping,

    /// Database operations
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Document operations
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },
}

/// Database subcommands
#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// List all databases
    List,

    /// Create a database
    Create {
        name: String,

        /// Create a partitioned database
        #[arg(long)]
        partitioned: bool,
    },

    /// Show database metadata
    Info { name: String },

    /// Delete a database
    Delete { name: String },

    /// List documents with their bodies
    Docs {
        name: String,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u64>,

        /// Extra query parameter, KEY=VALUE (repeatable)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

/// Document subcommands
#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Fetch a document
    Get { db: String, id: String },

    /// Insert a document
    Insert {
        db: String,
        #[command(flatten)]
        input: DocumentInput,
    },

    /// Replace a document (body must include the current _rev)
    Update {
        db: String,
        id: String,
        #[command(flatten)]
        input: DocumentInput,
    },

    /// Delete a document
    Delete {
        db: String,
        id: String,

        /// Current revision
        #[arg(long)]
        rev: String,
    },

    /// Insert a JSON array of documents in one request
    Bulk {
        db: String,
        #[command(flatten)]
        input: DocumentInput,
    },
}

/// Where a document body comes from
#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct DocumentInput {
    /// Inline document JSON
    #[arg(long)]
    pub json: Option<String>,

    /// File containing the document JSON
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}
