use serde::{Deserialize, Serialize};

/// Where the retrieval backend lives and how to authenticate against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer token attached to every request when set.
    pub token: Option<String>,
    /// No timeout unless configured.
    pub request_timeout_secs: Option<u64>,
}

/// Paging limits of the fetch-all routines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Records per backend request
    pub page_size: usize,
    /// Upper bound on requests (probe included) when loading chunks
    pub max_batches: usize,
    /// Upper bound on sequential pages when loading documents
    pub max_document_pages: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            token: None,
            request_timeout_secs: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 3000,
            max_batches: 10,
            max_document_pages: 100,
        }
    }
}

impl FetchConfig {
    /// Most records `fetch_all_chunks` can return.
    pub fn chunk_capacity(&self) -> usize {
        self.page_size * self.max_batches
    }
}
