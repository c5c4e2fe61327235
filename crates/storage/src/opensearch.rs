//! OpenSearch REST client for index creation and `_bulk` pushes.

use anyhow::{Context, Result};
use file_index_common::{Document, IndexError, OpenSearchConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// A single document the engine refused during a bulk push
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemError {
    pub id: Option<String>,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemResult>>,
}

#[derive(Debug, Deserialize)]
struct BulkItemResult {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reason: String,
}

impl ErrorBody {
    fn into_error(self) -> anyhow::Error {
        IndexError::Search {
            status: StatusCode::BAD_REQUEST.as_u16(),
            reason: format!("{}: {}", self.kind, self.reason),
        }
        .into()
    }
}

/// HTTP client for one OpenSearch cluster
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    endpoint: String,
    username: String,
    password: Option<String>,
    client: Client,
}

impl OpenSearchClient {
    pub fn new(config: &OpenSearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let instance = Self {
            endpoint: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        };

        info!(
            "Initialized OpenSearch client: endpoint={}, user={}, timeout={}s",
            instance.endpoint, instance.username, config.timeout_secs
        );

        Ok(instance)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .basic_auth(&self.username, self.password.as_deref())
    }

    /// Create `index` with date mappings.
    ///
    /// An existing index is reused, or dropped and recreated when `clear` is set.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn create_index(&self, index: &str, clear: bool) -> Result<()> {
        match self.put_index(index).await? {
            None => {
                info!("Created index: {}", index);
                Ok(())
            }
            Some(error) if error.kind == ALREADY_EXISTS => {
                if !clear {
                    info!("Index {} already exists, reusing it", index);
                    return Ok(());
                }

                info!("Index {} already exists, clearing it", index);
                self.delete_index(index).await?;
                match self.put_index(index).await? {
                    None => {
                        info!("Created index: {}", index);
                        Ok(())
                    }
                    Some(error) => Err(error.into_error()),
                }
            }
            Some(error) => Err(error.into_error()),
        }
    }

    /// `Ok(None)` on success, `Ok(Some(..))` for a 400 the caller may recover from.
    async fn put_index(&self, index: &str) -> Result<Option<ErrorBody>> {
        let response = self
            .request(reqwest::Method::PUT, index)
            .json(&index_body())
            .send()
            .await
            .with_context(|| format!("Failed to send create request for index {}", index))?;

        let status = response.status();
        if status.is_success() {
            return Ok(None);
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&text) {
                return Ok(Some(parsed.error));
            }
        }

        Err(IndexError::Search {
            status: status.as_u16(),
            reason: text,
        }
        .into())
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn delete_index(&self, index: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, index)
            .send()
            .await
            .with_context(|| format!("Failed to send delete request for index {}", index))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IndexError::Search {
                status: status.as_u16(),
                reason: text,
            }
            .into());
        }

        info!("Deleted index: {}", index);
        Ok(())
    }

    /// Bulk-index `documents` using each document's id.
    ///
    /// Returns the number of accepted documents and the per-item errors.
    #[instrument(skip(self, documents), fields(count = documents.len(), endpoint = %self.endpoint))]
    pub async fn push_batch(
        &self,
        documents: &[Document],
        index: &str,
    ) -> Result<(usize, Vec<BulkItemError>)> {
        if documents.is_empty() {
            return Ok((0, Vec::new()));
        }

        let body = bulk_body(documents, index)?;
        debug!("Sending bulk request: {} documents, {} bytes", documents.len(), body.len());

        let response = self
            .request(reqwest::Method::POST, "_bulk")
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .context("Failed to send bulk request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IndexError::Search {
                status: status.as_u16(),
                reason: text,
            }
            .into());
        }

        let parsed: BulkResponse = response
            .json()
            .await
            .context("Failed to parse bulk response")?;

        let outcome = bulk_outcome(parsed);
        if !outcome.1.is_empty() {
            warn!("Bulk push rejected {} of {} documents", outcome.1.len(), documents.len());
        }
        Ok(outcome)
    }
}

fn index_body() -> Value {
    let date = json!({
        "type": "date",
        "format": "strict_date_optional_time||epoch_millis"
    });
    json!({
        "mappings": {
            "properties": {
                "created": date.clone(),
                "modified": date.clone(),
                "indexed": date
            }
        }
    })
}

/// NDJSON body: an `index` action line with the explicit `_id`, then the source without it.
pub(crate) fn bulk_body(documents: &[Document], index: &str) -> Result<String> {
    let mut body = String::new();
    for document in documents {
        let mut source = serde_json::to_value(document)?;
        if let Some(object) = source.as_object_mut() {
            object.remove("_id");
        }
        let action = json!({ "index": { "_index": index, "_id": document.id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&source)?);
        body.push('\n');
    }
    Ok(body)
}

fn bulk_outcome(response: BulkResponse) -> (usize, Vec<BulkItemError>) {
    let mut success = 0;
    let mut errors = Vec::new();

    for item in response.items {
        for (_action, result) in item {
            if (200..300).contains(&result.status) && result.error.is_none() {
                success += 1;
            } else {
                let reason = result
                    .error
                    .as_ref()
                    .and_then(|e| e.get("reason").and_then(Value::as_str).map(str::to_string))
                    .or_else(|| result.error.as_ref().map(Value::to_string))
                    .unwrap_or_else(|| format!("status {}", result.status));
                errors.push(BulkItemError {
                    id: result.id,
                    status: result.status,
                    reason,
                });
            }
        }
    }

    if response.errors && errors.is_empty() {
        debug!("Bulk response flagged errors but no failing item was found");
    }

    (success, errors)
}
