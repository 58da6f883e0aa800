//! Database and document response types

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest document body Cloudant accepts, in bytes
pub const MAX_DOCUMENT_SIZE: usize = 1_048_576;

/// Result of a single document write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
    /// Set when the server answered 202: the write was stored but did not
    /// reach quorum yet
    #[serde(skip)]
    pub accepted: bool,
}

/// Per-document entry of a `_bulk_docs` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDocResult {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BulkDocResult {
    /// Whether this document was written
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.rev.is_some()
    }
}

/// `GET /{db}` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub db_name: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub props: Option<Value>,
    /// Remaining fields (`sizes`, `update_seq`, `cluster`, ...)
    #[serde(flatten)]
    pub other: JsonObject,
}

impl DatabaseInfo {
    /// Whether the database was created with `partitioned=true`
    pub fn is_partitioned(&self) -> bool {
        self.props
            .as_ref()
            .and_then(|p| p.get("partitioned"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// `GET /{db}/_all_docs` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllDocsResponse {
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

/// One row of `_all_docs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    /// Present when `include_docs=true`
    #[serde(default)]
    pub doc: Option<Value>,
}

impl AllDocsResponse {
    /// The documents carried by the rows, skipping rows without one
    pub fn docs(&self) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(|r| r.doc.as_ref())
    }
}
