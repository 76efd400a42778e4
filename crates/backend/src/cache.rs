use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

/// Remembers which collections already have their chunks loaded.
#[derive(Clone, Default)]
pub struct LoadCache {
    loaded: Arc<DashMap<String, Instant>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, collection_id: &str) -> bool {
        self.loaded.contains_key(collection_id)
    }

    pub fn mark_loaded(&self, collection_id: &str) {
        self.loaded.insert(collection_id.to_string(), Instant::now());
    }

    pub fn invalidate(&self, collection_id: &str) {
        self.loaded.remove(collection_id);
    }

    pub fn loaded_at(&self, collection_id: &str) -> Option<Instant> {
        self.loaded.get(collection_id).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn clear(&self) {
        self.loaded.clear();
    }
}
