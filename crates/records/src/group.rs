use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;

/// All chunks sharing one `file_id`, i.e. one source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentGroup {
    pub source: String,
    pub file_id: String,
    pub chunk_count: usize,
    pub total_chars: usize,
    pub created_at: String,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
