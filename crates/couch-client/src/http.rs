//! HTTP client for a single CouchDB node.

use crate::{Document, DocumentStore, NodeAddress, RangeQuery, StoreError, ViewRow};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection options shared by every node client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upper bound on one request; a hung node surfaces as a transport error.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Deserialize)]
struct WriteResponse {
    rev: String,
}

#[derive(Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

#[derive(Deserialize)]
struct AllDocsRow {
    id: String,
    #[serde(default)]
    doc: Option<Value>,
}

/// `DocumentStore` backed by one CouchDB node's HTTP API.
pub struct CouchNodeClient {
    node: NodeAddress,
    database: String,
    database_url: Url,
    client: Client,
    options: ClientOptions,
}

impl CouchNodeClient {
    /// Build a client for `database` on `node`. Performs no I/O.
    pub fn new(
        node: NodeAddress,
        database: &str,
        options: ClientOptions,
    ) -> Result<Self, StoreError> {
        let mut database_url = Url::parse(&format!("{}/", node.base_url()))
            .map_err(|e| StoreError::Transport(format!("Invalid node URL for {node}: {e}")))?;
        database_url
            .path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("Node URL for {node} cannot be a base")))?
            .pop_if_empty()
            .push(database);

        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            node,
            database: database.to_string(),
            database_url,
            client,
            options,
        })
    }

    pub fn node(&self) -> &NodeAddress {
        &self.node
    }

    /// Create the database unless it already exists.
    pub async fn ensure_database(&self) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, self.database_url.clone())
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => {
                tracing::info!("Created database '{}' on {}", self.database, self.node);
                Ok(())
            }
            StatusCode::PRECONDITION_FAILED => {
                tracing::debug!("Database '{}' already exists on {}", self.database, self.node);
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Transport(format!(
                    "Failed to create database '{}' on {}: HTTP {status}: {body}",
                    self.database, self.node
                )))
            }
        }
    }

    fn document_url(&self, id: &str) -> Result<Url, StoreError> {
        let mut url = self.database_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("Invalid document URL for '{id}'")))?
            .push(id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::trace!("{method} {url}");
        let builder = self.client.request(method, url);
        match &self.options.username {
            Some(username) => builder.basic_auth(username, self.options.password.as_ref()),
            None => builder,
        }
    }

    async fn check_status(&self, response: Response, id: &str) -> Result<Response, StoreError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            StatusCode::CONFLICT => Err(StoreError::Conflict(id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Transport(format!(
                    "HTTP {status} from {} for '{id}': {body}",
                    self.node
                )))
            }
        }
    }

    async fn put_document(&self, document: &Document) -> Result<String, StoreError> {
        let url = self.document_url(&document.id)?;
        let response = self
            .request(Method::PUT, url)
            .json(&document.to_json())
            .send()
            .await?;
        let response = self.check_status(response, &document.id).await?;
        let written: WriteResponse = response.json().await?;
        Ok(written.rev)
    }
}

#[async_trait::async_trait]
impl DocumentStore for CouchNodeClient {
    async fn create(&self, document: &Document) -> Result<String, StoreError> {
        let fresh = Document {
            revision: None,
            ..document.clone()
        };
        self.put_document(&fresh).await
    }

    async fn read(&self, id: &str) -> Result<Document, StoreError> {
        let url = self.document_url(id)?;
        let response = self.request(Method::GET, url).send().await?;
        let response = self.check_status(response, id).await?;
        let body: Value = response.json().await?;
        Document::from_json(body).map_err(|e| StoreError::Decode(format!("Document '{id}': {e}")))
    }

    async fn update(&self, document: &Document) -> Result<String, StoreError> {
        self.put_document(document).await
    }

    async fn delete(&self, id: &str, revision: &str) -> Result<String, StoreError> {
        let url = self.document_url(id)?;
        let response = self
            .request(Method::DELETE, url)
            .query(&[("rev", revision)])
            .send()
            .await?;
        let response = self.check_status(response, id).await?;
        let written: WriteResponse = response.json().await?;
        Ok(written.rev)
    }

    async fn range_query(&self, query: &RangeQuery) -> Result<Vec<ViewRow>, StoreError> {
        let mut url = self.database_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("Invalid _all_docs URL".to_string()))?
            .push("_all_docs");

        let start_key = serde_json::to_string(&query.start_key)
            .map_err(|e| StoreError::Transport(format!("Failed to encode start key: {e}")))?;
        let mut params = vec![
            ("startkey", start_key),
            ("include_docs", query.include_docs.to_string()),
        ];
        if query.limit != usize::MAX {
            params.push(("limit", query.limit.to_string()));
        }

        let response = self.request(Method::GET, url).query(&params).send().await?;
        let response = self.check_status(response, &self.database).await?;
        let result: AllDocsResponse = response.json().await?;

        Ok(result
            .rows
            .into_iter()
            .map(|row| ViewRow {
                id: row.id,
                body: row.doc.map(|doc| doc.to_string()),
            })
            .collect())
    }
}
