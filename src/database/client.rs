//! Cloudant database client
//!
//! Database lifecycle and document CRUD over the instance's HTTP API. Every
//! method issues exactly one request, authenticated with the configured
//! [`AuthMethod`], and maps the status codes Cloudant documents for that
//! endpoint onto [`Error`] variants.

use super::types::{
    AllDocsResponse, BulkDocResult, DatabaseInfo, DocumentResult, MAX_DOCUMENT_SIZE,
};
use crate::auth::{AuthMethod, Credentials};
use crate::config::is_blank;
use crate::error::{Error, Result};
use crate::http::{read_json, HttpClient, RequestConfig};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn, Instrument, Span};
use url::Url;

/// Client for one Cloudant instance
#[derive(Debug, Clone)]
pub struct CloudantClient {
    http: HttpClient,
    credentials: Credentials,
    auth_method: AuthMethod,
    span: Span,
}

impl CloudantClient {
    /// Create a client using the preferred available credential
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_client(HttpClient::new()?, credentials)
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(http: HttpClient, credentials: Credentials) -> Result<Self> {
        if is_blank(&credentials.base_url) {
            return Err(Error::missing_input("host"));
        }
        let auth_method = credentials
            .preferred_method()
            .ok_or_else(|| Error::missing_input("credentials"))?;

        Ok(Self {
            http,
            credentials,
            auth_method,
            span: Span::none(),
        })
    }

    /// Authenticate with a specific method instead of the preferred one
    pub fn with_auth_method(mut self, method: AuthMethod) -> Result<Self> {
        if !self.credentials.has(method) {
            return Err(Error::missing_input(format!("{method} credential")));
        }
        self.auth_method = method;
        Ok(self)
    }

    /// Attach a span that every request made by this client is recorded under
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The credentials in use
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The authentication method in use
    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    // ========================================================================
    // Instance
    // ========================================================================

    /// Fetch the instance welcome document
    pub async fn ping(&self) -> Result<Value> {
        let response = self.send(Method::GET, &[], RequestConfig::new()).await?;
        expect_json(response, &[StatusCode::OK]).await
    }

    // ========================================================================
    // Databases
    // ========================================================================

    /// Create a database
    pub async fn create_database(&self, name: &str, partitioned: bool) -> Result<()> {
        require("database name", name)?;
        debug!("Creating database '{}' (partitioned: {})", name, partitioned);

        let request = RequestConfig::new().query("partitioned", partitioned.to_string());
        let response = self.send(Method::PUT, &[name], request).await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::ACCEPTED => {
                warn!("Database '{}' created but quorum not met", name);
                Ok(())
            }
            StatusCode::BAD_REQUEST => {
                error!("Database name '{}' is invalid", name);
                Err(Error::InvalidDatabaseName {
                    name: name.to_string(),
                })
            }
            StatusCode::PRECONDITION_FAILED => {
                error!("Database '{}' already exists", name);
                Err(Error::DatabaseExists {
                    name: name.to_string(),
                })
            }
            _ => Err(rejected(response).await),
        }
    }

    /// Fetch database metadata
    pub async fn database_info(&self, name: &str) -> Result<DatabaseInfo> {
        require("database name", name)?;
        let response = self.send(Method::GET, &[name], RequestConfig::new()).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("database '{name}'")));
        }
        expect_json(response, &[StatusCode::OK]).await
    }

    /// List all database names
    pub async fn list_databases(&self) -> Result<Vec<String>> {
        let response = self
            .send(Method::GET, &["_all_dbs"], RequestConfig::new())
            .await?;
        let dbs: Vec<String> = expect_json(response, &[StatusCode::OK]).await?;
        debug!("Found {} databases", dbs.len());
        Ok(dbs)
    }

    /// List the documents of a database, bodies included
    ///
    /// `query` is appended to `include_docs=true`, e.g. `limit` or `startkey`.
    pub async fn all_documents(
        &self,
        name: &str,
        query: &[(String, String)],
    ) -> Result<AllDocsResponse> {
        require("database name", name)?;

        let mut request = RequestConfig::new().query("include_docs", "true");
        for (key, value) in query {
            request = request.query(key.as_str(), value.as_str());
        }

        let response = self.send(Method::GET, &[name, "_all_docs"], request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("database '{name}'")));
        }
        expect_json(response, &[StatusCode::OK]).await
    }

    /// Delete a database
    pub async fn delete_database(&self, name: &str) -> Result<()> {
        require("database name", name)?;
        debug!("Deleting database '{}'", name);

        let response = self
            .send(Method::DELETE, &[name], RequestConfig::new())
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::ACCEPTED => {
                warn!("Database '{}' deleted but quorum not met", name);
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                error!("Database '{}' does not exist", name);
                Err(Error::not_found(format!("database '{name}'")))
            }
            _ => Err(rejected(response).await),
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Insert a new document; the server assigns `_id` when absent
    pub async fn insert_document(&self, db: &str, doc: &Value) -> Result<DocumentResult> {
        require("database name", db)?;
        check_size(doc)?;

        let request = RequestConfig::new().json(doc.clone());
        let response = self.send(Method::POST, &[db], request).await?;

        let id = doc.get("_id").and_then(Value::as_str).unwrap_or_default();
        write_result(response, db, id).await
    }

    /// Fetch a document by `_id`
    pub async fn get_document(&self, db: &str, id: &str) -> Result<Value> {
        require("database name", db)?;
        require("document id", id)?;

        let response = self
            .send(Method::GET, &[db, id], RequestConfig::new())
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("document '{id}' in '{db}'")));
        }
        expect_json(response, &[StatusCode::OK]).await
    }

    /// Replace a document; `doc` must carry the current `_rev`
    pub async fn update_document(
        &self,
        db: &str,
        id: &str,
        doc: &Value,
    ) -> Result<DocumentResult> {
        require("database name", db)?;
        require("document id", id)?;
        check_size(doc)?;

        let request = RequestConfig::new().json(doc.clone());
        let response = self.send(Method::PUT, &[db, id], request).await?;
        write_result(response, db, id).await
    }

    /// Delete a document at revision `rev`
    pub async fn delete_document(&self, db: &str, id: &str, rev: &str) -> Result<DocumentResult> {
        require("database name", db)?;
        require("document id", id)?;
        require("document rev", rev)?;

        let request = RequestConfig::new().query("rev", rev);
        let response = self.send(Method::DELETE, &[db, id], request).await?;
        write_result(response, db, id).await
    }

    /// Insert or update many documents in one request
    ///
    /// A successful response does not mean every document was written; check
    /// each [`BulkDocResult`].
    pub async fn insert_bulk(&self, db: &str, docs: &[Value]) -> Result<Vec<BulkDocResult>> {
        require("database name", db)?;
        debug!("Inserting {} documents in bulk into '{}'", docs.len(), db);

        let body = json!({ "docs": docs });
        check_size(&body)?;

        let request = RequestConfig::new().json(body);
        let response = self
            .send(Method::POST, &[db, "_bulk_docs"], request)
            .await?;

        let status = response.status();
        let results: Vec<BulkDocResult> =
            expect_json(response, &[StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED])
                .await?;

        if status == StatusCode::ACCEPTED {
            warn!("Bulk insert into '{}' stored but quorum not met", db);
        }
        let failed = results.iter().filter(|r| !r.is_ok()).count();
        if failed > 0 {
            warn!(
                "Bulk insert into '{}': {} of {} documents failed",
                db,
                failed,
                results.len()
            );
        }
        Ok(results)
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    /// Join path segments onto the base URL, percent-encoding each one
    pub fn url(&self, segments: &[&str]) -> Result<String> {
        let mut url = Url::parse(&self.credentials.base_url)?;
        url.path_segments_mut()
            .map_err(|()| Error::config(format!("invalid base URL: {}", self.credentials.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        request: RequestConfig,
    ) -> Result<Response> {
        let url = self.url(segments)?;
        let request = self
            .credentials
            .apply(request.header("Accept", "application/json"), self.auth_method)?;

        self.http
            .request(method, &url, request)
            .instrument(self.span.clone())
            .await
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if is_blank(value) {
        return Err(Error::missing_input(what));
    }
    Ok(())
}

fn check_size(doc: &Value) -> Result<()> {
    let size = serde_json::to_vec(doc)?.len();
    if size >= MAX_DOCUMENT_SIZE {
        error!("Document of {} bytes exceeds the 1MB limit", size);
        return Err(Error::DocumentTooLarge {
            size,
            limit: MAX_DOCUMENT_SIZE,
        });
    }
    Ok(())
}

async fn rejected(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    error!("Request rejected with HTTP {}: {}", status, body);
    Error::upstream(status, body)
}

async fn expect_json<T: DeserializeOwned>(response: Response, ok: &[StatusCode]) -> Result<T> {
    if !ok.contains(&response.status()) {
        return Err(rejected(response).await);
    }
    read_json(response).await
}

async fn write_result(response: Response, db: &str, id: &str) -> Result<DocumentResult> {
    match response.status() {
        StatusCode::OK | StatusCode::CREATED => read_json(response).await,
        StatusCode::ACCEPTED => {
            warn!("Write to '{}' in '{}' stored but quorum not met", id, db);
            let mut result: DocumentResult = read_json(response).await?;
            result.accepted = true;
            Ok(result)
        }
        StatusCode::CONFLICT => {
            error!("Conflict writing '{}' in '{}': stale or missing _rev", id, db);
            Err(Error::Conflict { id: id.to_string() })
        }
        StatusCode::NOT_FOUND => Err(Error::not_found(format!("document '{id}' in '{db}'"))),
        _ => Err(rejected(response).await),
    }
}
