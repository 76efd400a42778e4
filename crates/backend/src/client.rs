use records::{Chunk, Collection, DeleteRequest, DocumentFlag, DocumentGroup};
use reqwest::{Method, Url};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};

/// HTTP client for the retrieval backend's REST API.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            client: builder.build()?,
        })
    }

    /// Same client, authenticating with `token` instead.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// Non-2xx answers and bodies carrying `"success": false` become
    /// `BackendError::Rejected` with the backend's `detail` or `message`.
    /// An empty body decodes to `Value::Null`.
    ///
    /// Each entry of `segments` is one path segment. Ids coming from callers
    /// are percent-encoded, so they can never add or climb path levels.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url_for(segments)?;
        let target = url.path().to_owned();
        let path = target.as_str();
        debug!(%method, %url, "backend request");

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| format!("{method} {path} failed: {status}"));
            warn!(%method, path, status = status.as_u16(), %message, "backend rejected request");
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| BackendError::Decode(format!("{path}: {e}")))?;

        if value.get("success").and_then(Value::as_bool) == Some(false) {
            let message = error_message(&text)
                .unwrap_or_else(|| format!("{method} {path} reported failure"));
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(value)
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BackendError::Validation(format!("Invalid backend URL: {e}")))?;
        for segment in segments {
            check_segment(segment)?;
        }
        url.path_segments_mut()
            .map_err(|_| BackendError::Validation(format!("Invalid backend URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        let value = self.request(Method::GET, &["collections"], &[], None).await?;
        decode(value, "/collections")
    }

    /// One page of chunks of a collection.
    pub async fn fetch_documents(
        &self,
        collection_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Chunk>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let segments = ["collections", collection_id, "documents"];
        let value = self.request(Method::GET, &segments, &query, None).await?;
        decode_list(value, "documents")
    }

    /// Documents as grouped by the backend itself.
    pub async fn fetch_document_groups(
        &self,
        collection_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DocumentGroup>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let segments = ["collections", collection_id, "document-groups"];
        let value = self.request(Method::GET, &segments, &query, None).await?;
        decode_list(value, "document-groups")
    }

    pub async fn delete_documents(
        &self,
        collection_id: &str,
        request: &DeleteRequest,
    ) -> Result<Value> {
        let body = serde_json::to_value(request)
            .map_err(|e| BackendError::Decode(format!("delete body: {e}")))?;
        let segments = ["collections", collection_id, "documents"];
        self.request(Method::DELETE, &segments, &[], Some(&body)).await
    }

    /// Sets one boolean flag on one document. Returns the updated record.
    pub async fn set_flag(
        &self,
        collection_id: &str,
        document_id: &str,
        flag: DocumentFlag,
        value: bool,
    ) -> Result<Value> {
        let segments = flag.backend_segments(collection_id, document_id);
        let mut body = serde_json::Map::new();
        body.insert(flag.field().to_string(), Value::Bool(value));
        let body = Value::Object(body);
        self.request(Method::PATCH, &segments, &[], Some(&body)).await
    }

    pub async fn update_collection(
        &self,
        collection_id: &str,
        name: &str,
        metadata: Value,
    ) -> Result<Collection> {
        let body = json!({ "name": name, "metadata": metadata });
        let segments = ["collections", collection_id];
        let value = self.request(Method::PATCH, &segments, &[], Some(&body)).await?;
        decode(value, "collection")
    }

    pub async fn sign_out(&self) -> Result<Value> {
        self.request(Method::POST, &["auth", "signout"], &[], None).await
    }

    pub async fn health(&self) -> Result<Value> {
        self.request(Method::GET, &["health"], &[], None).await
    }
}

/// Checks that collection metadata typed by a user is valid JSON. The content
/// itself is not validated.
pub fn parse_metadata_json(text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| BackendError::Validation(format!("Invalid JSON format: {e}")))
}

/// Rejects segments that are empty, `.`/`..`, or carry separators.
fn check_segment(segment: &str) -> Result<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '?', '#']);
    if invalid {
        return Err(BackendError::Validation(format!("Invalid path segment: {segment:?}")));
    }
    Ok(())
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|key| match value.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, path: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| BackendError::Decode(format!("{path}: {e}")))
}

/// Lists may come back null; treat that as empty.
fn decode_list<T: serde::de::DeserializeOwned>(value: Value, path: &str) -> Result<Vec<T>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(value, path)
}
