use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u64>,
}

impl Collection {
    /// Whether the verification columns (severity, score, verified,
    /// vulnerable) should be shown for this collection.
    pub fn verify_checkbox(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("verify_checkbox"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
