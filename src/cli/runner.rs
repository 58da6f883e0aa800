//! CLI runner - executes commands

use crate::auth::{AuthMethod, CredentialResolver, Credentials};
use crate::cli::commands::{Cli, Commands, DbCommands, DocCommands, DocumentInput, OutputFormat};
use crate::config::AccountConfig;
use crate::database::CloudantClient;
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig};
use serde_json::{json, Value};
use std::fs;
use std::time::Duration;
use tracing::{debug, info_span, Span};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let span = info_span!("cloudant", host = %config.host);
        let http = self.build_http_client()?;
        let resolver = CredentialResolver::with_client(http.clone()).with_span(span.clone());

        let credentials = resolver.resolve_all(&config).await;

        match &self.cli.command {
            Commands::Auth => self.auth(&credentials),
            Commands::Session => {
                let info = resolver.session_info(&credentials).await?;
                self.output_message(&json!({"type": "SESSION", "session": info}));
                Ok(())
            }
            Commands::Ping => {
                let client = self.build_client(http, credentials, span)?;
                let welcome = client.ping().await?;
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "auth": client.auth_method(),
                        "server": welcome
                    }
                }));
                Ok(())
            }
            Commands::Db { command } => {
                let client = self.build_client(http, credentials, span)?;
                self.database(&client, command).await
            }
            Commands::Doc { command } => {
                let client = self.build_client(http, credentials, span)?;
                self.document(&client, command).await
            }
        }
    }

    /// Load the account config from the file given with `-C`, or the environment
    fn load_config(&self) -> Result<AccountConfig> {
        match &self.cli.config {
            Some(path) => AccountConfig::from_file(path),
            None => {
                debug!("No config file given, reading CLOUDANT_* environment variables");
                Ok(AccountConfig::from_env())
            }
        }
    }

    fn build_http_client(&self) -> Result<HttpClient> {
        let config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.cli.timeout))
            .build();
        HttpClient::with_config(config)
    }

    fn build_client(
        &self,
        http: HttpClient,
        credentials: Credentials,
        span: Span,
    ) -> Result<CloudantClient> {
        let client = CloudantClient::with_client(http, credentials)?.with_span(span);
        match self.cli.auth {
            Some(method) => client.with_auth_method(method),
            None => Ok(client),
        }
    }

    /// Report resolved credentials without printing the secrets
    fn auth(&self, credentials: &Credentials) -> Result<()> {
        let expires_at = credentials.bearer.as_ref().and_then(|b| b.expires_at);
        self.output_message(&json!({
            "type": "CREDENTIALS",
            "credentials": {
                "base_url": credentials.base_url,
                "basic": credentials.has(AuthMethod::Basic),
                "cookie": credentials.has(AuthMethod::Cookie),
                "bearer": credentials.has(AuthMethod::Bearer),
                "bearer_expires_at": expires_at,
                "preferred": credentials.preferred_method(),
            }
        }));

        if credentials.is_empty() {
            return Err(Error::missing_input("credentials"));
        }
        Ok(())
    }

    async fn database(&self, client: &CloudantClient, command: &DbCommands) -> Result<()> {
        match command {
            DbCommands::List => {
                let dbs = client.list_databases().await?;
                self.output_message(&json!({"type": "DATABASES", "databases": dbs}));
            }
            DbCommands::Create { name, partitioned } => {
                client.create_database(name, *partitioned).await?;
                self.output_message(&json!({
                    "type": "DATABASE_CREATED",
                    "database": name,
                    "partitioned": partitioned
                }));
            }
            DbCommands::Info { name } => {
                let info = client.database_info(name).await?;
                self.output_message(&json!({"type": "DATABASE_INFO", "info": info}));
            }
            DbCommands::Delete { name } => {
                client.delete_database(name).await?;
                self.output_message(&json!({"type": "DATABASE_DELETED", "database": name}));
            }
            DbCommands::Docs {
                name,
                limit,
                params,
            } => {
                let mut query = params.clone();
                if let Some(limit) = limit {
                    query.push(("limit".to_string(), limit.to_string()));
                }
                let docs = client.all_documents(name, &query).await?;
                self.output_message(&json!({"type": "DOCUMENTS", "documents": docs}));
            }
        }
        Ok(())
    }

    async fn document(&self, client: &CloudantClient, command: &DocCommands) -> Result<()> {
        match command {
            DocCommands::Get { db, id } => {
                let doc = client.get_document(db, id).await?;
                self.output_message(&json!({"type": "DOCUMENT", "document": doc}));
            }
            DocCommands::Insert { db, input } => {
                let doc = read_document(input)?;
                let result = client.insert_document(db, &doc).await?;
                self.output_message(&json!({"type": "DOCUMENT_WRITTEN", "result": result}));
            }
            DocCommands::Update { db, id, input } => {
                let doc = read_document(input)?;
                let result = client.update_document(db, id, &doc).await?;
                self.output_message(&json!({"type": "DOCUMENT_WRITTEN", "result": result}));
            }
            DocCommands::Delete { db, id, rev } => {
                let result = client.delete_document(db, id, rev).await?;
                self.output_message(&json!({"type": "DOCUMENT_DELETED", "result": result}));
            }
            DocCommands::Bulk { db, input } => {
                let docs = match read_document(input)? {
                    Value::Array(docs) => docs,
                    _ => return Err(Error::config("Bulk input must be a JSON array")),
                };
                let results = client.insert_bulk(db, &docs).await?;
                self.output_message(&json!({"type": "BULK_RESULT", "results": results}));
            }
        }
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Read a document body from inline JSON or a file
fn read_document(input: &DocumentInput) -> Result<Value> {
    if let Some(json_str) = &input.json {
        return serde_json::from_str(json_str).context("Invalid document JSON");
    }

    if let Some(path) = &input.file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document file {}", path.display()))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("Invalid document JSON in {}", path.display()));
    }

    Err(Error::config("Document not specified (use --json or --file)"))
}
