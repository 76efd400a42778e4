use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which view of a collection is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveTab {
    #[default]
    Documents,
    Chunks,
}

impl FromStr for ActiveTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "documents" => Ok(Self::Documents),
            "chunks" => Ok(Self::Chunks),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

impl fmt::Display for ActiveTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Documents => f.write_str("documents"),
            Self::Chunks => f.write_str("chunks"),
        }
    }
}

/// Per-chunk boolean markers with their own backend endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFlag {
    Verified,
    Vulnerable,
}

impl DocumentFlag {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Vulnerable => "vulnerable",
        }
    }

    /// Backend path segments for a flag update on one document.
    pub fn backend_segments<'a>(&self, collection_id: &'a str, document_id: &'a str) -> Vec<&'a str> {
        let mut segments = vec!["collections", collection_id, "documents", document_id];
        if let Self::Vulnerable = self {
            segments.push("vulnerable");
        }
        segments
    }
}

/// Body of a bulk delete. Documents are deleted by source file, chunks by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeleteRequest {
    Files { file_ids: Vec<String> },
    Documents { document_ids: Vec<String> },
}

impl DeleteRequest {
    pub fn for_tab(tab: ActiveTab, ids: Vec<String>) -> Self {
        match tab {
            ActiveTab::Documents => Self::Files { file_ids: ids },
            ActiveTab::Chunks => Self::Documents { document_ids: ids },
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            Self::Files { file_ids } => file_ids,
            Self::Documents { document_ids } => document_ids,
        }
    }
}

/// Response shape of every proxy route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_request_field_follows_tab() {
        let ids = vec!["a".to_string(), "b".to_string()];

        let docs = DeleteRequest::for_tab(ActiveTab::Documents, ids.clone());
        assert_eq!(serde_json::to_value(&docs).unwrap(), json!({"file_ids": ["a", "b"]}));

        let chunks = DeleteRequest::for_tab(ActiveTab::Chunks, ids);
        assert_eq!(serde_json::to_value(&chunks).unwrap(), json!({"document_ids": ["a", "b"]}));
    }

    #[test]
    fn test_flag_paths() {
        assert_eq!(
            DocumentFlag::Verified.backend_segments("c", "d"),
            vec!["collections", "c", "documents", "d"]
        );
        assert_eq!(
            DocumentFlag::Vulnerable.backend_segments("c", "d"),
            vec!["collections", "c", "documents", "d", "vulnerable"]
        );
    }

    #[test]
    fn test_tab_parsing() {
        assert_eq!("chunks".parse::<ActiveTab>(), Ok(ActiveTab::Chunks));
        assert!("files".parse::<ActiveTab>().is_err());
    }
}
