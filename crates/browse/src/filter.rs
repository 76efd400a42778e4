use records::{Chunk, DocumentGroup};
use std::collections::HashSet;

/// Anything that can be filtered by its resolved source name.
pub trait HasSource {
    fn source_name(&self) -> &str;
}

impl HasSource for Chunk {
    fn source_name(&self) -> &str {
        self.source()
    }
}

impl HasSource for DocumentGroup {
    fn source_name(&self) -> &str {
        &self.source
    }
}

/// Keeps the items whose source is in `selected`. An empty selection keeps
/// everything.
pub fn filter_by_source<T: HasSource + Clone>(items: &[T], selected: &[String]) -> Vec<T> {
    if selected.is_empty() {
        return items.to_vec();
    }
    let wanted: HashSet<&str> = selected.iter().map(String::as_str).collect();
    items
        .iter()
        .filter(|item| wanted.contains(item.source_name()))
        .cloned()
        .collect()
}

/// Distinct sources across `chunks`, in first-seen order.
pub fn extract_available_sources(chunks: &[Chunk]) -> Vec<String> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .map(Chunk::source)
        .filter(|source| seen.insert(*source))
        .map(str::to_string)
        .collect()
}
