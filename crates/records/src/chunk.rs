use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Placeholder shown wherever a metadata field is missing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single retrievable text unit as returned by the backend.
///
/// Decoding never fails on an unexpected value type: a page with one odd
/// record must still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(deserialize_with = "text_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: ChunkMetadata,

    // Optional top-level fields some backend versions send
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub page_content: Option<String>,
}

/// Known metadata keys are typed; everything else the backend attaches is
/// kept untouched in `extra`.
///
/// A known key whose value has an unexpected type keeps its raw value in
/// `extra`. Text fields still get a display form when the value is a number
/// or a bool; flags only accept bools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ChunkMetadata {
    pub source: Option<String>,
    pub file_id: Option<String>,
    pub timestamp: Option<String>,
    pub created_at: Option<String>,
    pub date: Option<String>,
    pub verified: Option<bool>,
    pub vulnerable: Option<bool>,
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for ChunkMetadata {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            source: take_text(&mut map, "source"),
            file_id: take_text(&mut map, "file_id"),
            timestamp: take_text(&mut map, "timestamp"),
            created_at: take_text(&mut map, "created_at"),
            date: take_text(&mut map, "date"),
            verified: take_flag(&mut map, "verified"),
            vulnerable: take_flag(&mut map, "vulnerable"),
            extra: map,
        }
    }
}

impl From<ChunkMetadata> for Map<String, Value> {
    fn from(metadata: ChunkMetadata) -> Self {
        metadata.entries().into_iter().collect()
    }
}

/// Moves a string out of `map`. Numbers and bools are rendered as text but
/// stay in `map` with their original type.
fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    if matches!(map.get(key)?, Value::String(_) | Value::Null) {
        return map.remove(key).and_then(text_of);
    }
    map.get(key).cloned().and_then(text_of)
}

/// Moves a bool out of `map`; any other value stays where it is.
fn take_flag(map: &mut Map<String, Value>, key: &str) -> Option<bool> {
    if matches!(map.get(key)?, Value::Bool(_) | Value::Null) {
        return map.remove(key).and_then(|v| v.as_bool());
    }
    None
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(text_of(Value::deserialize(deserializer)?))
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn metadata_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ChunkMetadata, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => ChunkMetadata::from(map),
        _ => ChunkMetadata::default(),
    })
}

impl Chunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
            ..Default::default()
        }
    }

    /// Character count of the content (Unicode scalar values, not bytes)
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn source(&self) -> &str {
        self.metadata.source()
    }

    pub fn file_id(&self) -> &str {
        self.metadata.file_id()
    }
}

impl ChunkMetadata {
    pub fn source(&self) -> &str {
        non_empty_or_na(self.source.as_deref())
    }

    pub fn file_id(&self) -> &str {
        non_empty_or_na(self.file_id.as_deref())
    }

    /// Display timestamp: `timestamp`, then `created_at`, then `date`.
    pub fn display_timestamp(&self) -> &str {
        first_present(&[&self.timestamp, &self.created_at, &self.date])
    }

    /// Creation time: `created_at`, then `timestamp`, then `date`.
    pub fn display_created_at(&self) -> &str {
        first_present(&[&self.created_at, &self.timestamp, &self.date])
    }

    /// Looks up any key, typed or extra, as JSON.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All present entries: known keys first, then extras in backend order.
    /// A key kept raw in `extra` is listed once, with its raw value.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut out = Vec::with_capacity(self.extra.len() + 7);
        let strings = [
            ("source", &self.source),
            ("file_id", &self.file_id),
            ("timestamp", &self.timestamp),
            ("created_at", &self.created_at),
            ("date", &self.date),
        ];
        for (key, value) in strings {
            if let Some(v) = value.as_ref().filter(|_| !self.extra.contains_key(key)) {
                out.push((key.to_string(), Value::String(v.clone())));
            }
        }
        for (key, value) in [("verified", self.verified), ("vulnerable", self.vulnerable)] {
            if let Some(v) = value.filter(|_| !self.extra.contains_key(key)) {
                out.push((key.to_string(), Value::Bool(v)));
            }
        }
        out.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }
}

fn non_empty_or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

fn first_present<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .find_map(|c| c.as_deref().filter(|v| !v.is_empty()))
        .unwrap_or(NOT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_keeps_unknown_metadata() {
        let chunk: Chunk = serde_json::from_value(json!({
            "id": "c1",
            "content": "hello",
            "metadata": {
                "source": "a.pdf",
                "file_id": "f1",
                "verified": true,
                "score": 0.87,
                "tags": ["x", "y"]
            }
        }))
        .unwrap();

        assert_eq!(chunk.source(), "a.pdf");
        assert_eq!(chunk.metadata.verified, Some(true));
        assert_eq!(chunk.metadata.extra.get("score"), Some(&json!(0.87)));
        assert_eq!(chunk.metadata.get("tags"), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_missing_metadata_defaults_to_na() {
        let chunk: Chunk = serde_json::from_value(json!({"id": "c1", "content": "x"})).unwrap();
        assert_eq!(chunk.source(), NOT_AVAILABLE);
        assert_eq!(chunk.file_id(), NOT_AVAILABLE);
        assert_eq!(chunk.metadata.display_timestamp(), NOT_AVAILABLE);
    }

    #[test]
    fn test_timestamp_fallback_order() {
        let meta = ChunkMetadata {
            created_at: Some("2024-01-02".into()),
            date: Some("2024-01-03".into()),
            ..Default::default()
        };
        assert_eq!(meta.display_timestamp(), "2024-01-02");

        let meta = ChunkMetadata {
            timestamp: Some("t".into()),
            created_at: Some("c".into()),
            ..Default::default()
        };
        assert_eq!(meta.display_timestamp(), "t");
        assert_eq!(meta.display_created_at(), "c");
    }

    #[test]
    fn test_odd_value_types_do_not_reject_the_page() {
        let page: Vec<Chunk> = serde_json::from_value(json!([
            {"id": "c1", "content": "a", "metadata": {"timestamp": 1700000000}},
            {"id": "c2", "content": "b", "metadata": {"verified": "true", "vulnerable": null}},
            {"id": "c3", "content": "c", "metadata": {"file_id": 42, "source": ["x"]}},
            {"id": 4, "content": "d", "metadata": null, "chunk_index": "2", "file_id": 7},
            {"id": "c5", "content": "e", "metadata": {"source": "ok.pdf", "date": {"y": 2024}}}
        ]))
        .unwrap();
        assert_eq!(page.len(), 5);

        assert_eq!(page[0].metadata.display_timestamp(), "1700000000");
        assert_eq!(page[0].metadata.get("timestamp"), Some(json!(1700000000)));

        assert_eq!(page[1].metadata.verified, None);
        assert_eq!(page[1].metadata.get("verified"), Some(json!("true")));
        assert_eq!(page[1].metadata.get("vulnerable"), None);

        assert_eq!(page[2].file_id(), "42");
        assert_eq!(page[2].source(), NOT_AVAILABLE);
        assert_eq!(page[2].metadata.get("source"), Some(json!(["x"])));

        assert_eq!(page[3].id, "4");
        assert_eq!(page[3].chunk_index, Some(2));
        assert_eq!(page[3].file_id.as_deref(), Some("7"));
        assert_eq!(page[3].source(), NOT_AVAILABLE);

        assert_eq!(page[4].source(), "ok.pdf");
        assert_eq!(page[4].metadata.display_timestamp(), NOT_AVAILABLE);
    }

    #[test]
    fn test_raw_keys_are_listed_once() {
        let metadata: ChunkMetadata =
            serde_json::from_value(json!({"file_id": 42, "source": "a.pdf"})).unwrap();
        let keys: Vec<String> = metadata.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["source", "file_id"]);

        let back = serde_json::to_value(&metadata).unwrap();
        assert_eq!(back, json!({"file_id": 42, "source": "a.pdf"}));
    }

    #[test]
    fn test_char_count_is_not_byte_length() {
        let chunk = Chunk::new("c1", "héllo", ChunkMetadata::default());
        assert_eq!(chunk.char_count(), 5);
    }
}
