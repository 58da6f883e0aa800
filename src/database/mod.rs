//! Cloudant database and document API
//!
//! `CloudantClient` wraps one instance: database lifecycle
//! (create/list/inspect/delete) and document CRUD including bulk insert.

mod client;
mod types;

pub use client::CloudantClient;
pub use types::{
    AllDocsResponse, AllDocsRow, BulkDocResult, DatabaseInfo, DocumentResult, MAX_DOCUMENT_SIZE,
};
