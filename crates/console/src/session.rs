//! State and operations behind the documents page: which collection is open,
//! what was fetched for it, what the user selected and filtered, and the
//! mutations that change backend data.

use anyhow::Context;
use backend::{
    BackendClient, BackendError, FetchConfig, Generation, LoadCache, Result, fetch_all_chunks,
    fetch_all_documents, parse_metadata_json,
};
use browse::{
    Pagination, Selection, Stats, calculate_stats, extract_available_sources, filter_by_source,
    group_by_file,
};
use records::{ActiveTab, Chunk, Collection, DeleteRequest, DocumentFlag, DocumentGroup};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// What happened to a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Results were stored; holds the record count.
    Applied(usize),
    /// Already loaded for this collection, nothing was requested.
    Cached,
    /// The selection changed, or a newer fetch or an invalidation happened,
    /// while the fetch was in flight; results dropped.
    Stale,
    NoCollection,
}

#[derive(Debug)]
pub struct SessionState {
    pub collections: Vec<Collection>,
    pub selected_collection: Option<String>,
    pub documents: Vec<Chunk>,
    pub document_groups: Vec<DocumentGroup>,
    pub chunks: Vec<Chunk>,
    pub loading_documents: bool,
    pub loading_chunks: bool,
    pub active_tab: ActiveTab,
    pub selected_documents: Selection,
    pub selected_chunks: Selection,
    pub selected_sources: Vec<String>,
    pub pending_flags: HashSet<String>,
    pub groups_page: Pagination,
    pub chunks_page: Pagination,
}

impl SessionState {
    fn new(items_per_page: usize) -> Self {
        Self {
            collections: Vec::new(),
            selected_collection: None,
            documents: Vec::new(),
            document_groups: Vec::new(),
            chunks: Vec::new(),
            loading_documents: false,
            loading_chunks: false,
            active_tab: ActiveTab::Documents,
            selected_documents: Selection::new(),
            selected_chunks: Selection::new(),
            selected_sources: Vec::new(),
            pending_flags: HashSet::new(),
            groups_page: Pagination::new(items_per_page),
            chunks_page: Pagination::new(items_per_page),
        }
    }

    pub fn selected(&self) -> Option<&Collection> {
        let uuid = self.selected_collection.as_deref()?;
        self.collections.iter().find(|c| c.uuid == uuid)
    }

    /// Finds a collection by uuid, falling back to its name.
    pub fn resolve_collection(&self, key: &str) -> Option<String> {
        self.collections
            .iter()
            .find(|c| c.uuid == key)
            .or_else(|| self.collections.iter().find(|c| c.name == key))
            .map(|c| c.uuid.clone())
    }

    pub fn available_sources(&self) -> Vec<String> {
        extract_available_sources(&self.documents)
    }

    pub fn filtered_groups(&self) -> Vec<DocumentGroup> {
        filter_by_source(&self.document_groups, &self.selected_sources)
    }

    /// Chunks of the active tab after source filtering.
    pub fn filtered_chunks(&self) -> Vec<Chunk> {
        let records = match self.active_tab {
            ActiveTab::Documents => &self.documents,
            ActiveTab::Chunks => &self.chunks,
        };
        filter_by_source(records, &self.selected_sources)
    }

    pub fn current_groups_page(&self) -> Vec<DocumentGroup> {
        self.groups_page.page_slice(&self.filtered_groups()).to_vec()
    }

    pub fn current_chunks_page(&self) -> Vec<Chunk> {
        self.chunks_page.page_slice(&self.filtered_chunks()).to_vec()
    }

    pub fn stats(&self) -> Stats {
        calculate_stats(&self.documents, &self.chunks, self.active_tab, None)
    }

    pub fn is_pending(&self, document_id: &str) -> bool {
        self.pending_flags.contains(document_id)
    }

    pub fn active_selection(&self) -> &Selection {
        match self.active_tab {
            ActiveTab::Documents => &self.selected_documents,
            ActiveTab::Chunks => &self.selected_chunks,
        }
    }

    fn active_selection_mut(&mut self) -> &mut Selection {
        match self.active_tab {
            ActiveTab::Documents => &mut self.selected_documents,
            ActiveTab::Chunks => &mut self.selected_chunks,
        }
    }

    pub fn active_pagination(&self) -> &Pagination {
        match self.active_tab {
            ActiveTab::Documents => &self.groups_page,
            ActiveTab::Chunks => &self.chunks_page,
        }
    }

    fn active_pagination_mut(&mut self) -> &mut Pagination {
        match self.active_tab {
            ActiveTab::Documents => &mut self.groups_page,
            ActiveTab::Chunks => &mut self.chunks_page,
        }
    }

    /// Selectable ids on the current page: file ids for documents, chunk ids
    /// for chunks.
    fn page_ids(&self) -> Vec<String> {
        match self.active_tab {
            ActiveTab::Documents => self
                .current_groups_page()
                .into_iter()
                .map(|g| g.file_id)
                .collect(),
            ActiveTab::Chunks => self
                .current_chunks_page()
                .into_iter()
                .map(|c| c.id)
                .collect(),
        }
    }

    fn sync_pages(&mut self) {
        let groups = self.filtered_groups().len();
        let chunks = self.filtered_chunks().len();
        self.groups_page.sync_len(groups);
        self.chunks_page.sync_len(chunks);
    }

    fn clear_data(&mut self) {
        self.documents.clear();
        self.document_groups.clear();
        self.chunks.clear();
        self.loading_documents = false;
        self.loading_chunks = false;
        self.selected_documents.clear();
        self.selected_chunks.clear();
        self.selected_sources.clear();
        self.pending_flags.clear();
        self.groups_page.reset();
        self.chunks_page.reset();
        self.sync_pages();
    }
}

pub struct Session {
    client: BackendClient,
    fetch: FetchConfig,
    generation: Generation,
    document_requests: Generation,
    chunk_requests: Generation,
    chunk_cache: LoadCache,
    chunk_load: Mutex<()>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(client: BackendClient, fetch: FetchConfig, items_per_page: usize) -> Self {
        Self {
            client,
            fetch,
            generation: Generation::new(),
            document_requests: Generation::new(),
            chunk_requests: Generation::new(),
            chunk_cache: LoadCache::new(),
            chunk_load: Mutex::new(()),
            state: Mutex::new(SessionState::new(items_per_page)),
        }
    }

    /// Locks the state for reading or rendering. Do not hold across calls to
    /// other session methods.
    pub async fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    pub fn chunk_cache(&self) -> &LoadCache {
        &self.chunk_cache
    }

    /// Loads the collection list and opens the first collection when none is
    /// open yet.
    pub async fn fetch_collections(&self) -> Result<usize> {
        let collections = self
            .client
            .list_collections()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to fetch collections"))?;
        let count = collections.len();

        let first = {
            let mut state = self.state.lock().await;
            state.collections = collections;
            match state.selected_collection {
                None => state.collections.first().map(|c| c.uuid.clone()),
                Some(_) => None,
            }
        };

        if let Some(uuid) = first {
            self.select_collection(&uuid).await?;
        }
        info!(collections = count, "fetched collections");
        Ok(count)
    }

    /// Switches to another collection. Fetches still running for the previous
    /// one will be discarded when they resolve.
    pub async fn select_collection(&self, uuid: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.collections.is_empty() && !state.collections.iter().any(|c| c.uuid == uuid) {
            return Err(BackendError::Validation(format!("Unknown collection: {uuid}")));
        }

        self.generation.advance();
        self.chunk_cache.invalidate(uuid);
        state.selected_collection = Some(uuid.to_string());
        state.clear_data();
        info!(collection = uuid, "selected collection");
        Ok(())
    }

    /// Loads every record of the open collection and regroups them by file.
    pub async fn fetch_documents(&self) -> Result<LoadOutcome> {
        let (collection, ticket, request) = {
            let mut state = self.state.lock().await;
            let Some(collection) = state.selected_collection.clone() else {
                return Ok(LoadOutcome::NoCollection);
            };
            state.loading_documents = true;
            (collection, self.generation.current(), self.document_requests.advance())
        };

        let result = fetch_all_documents(&self.client, &collection, &self.fetch).await;

        let mut state = self.state.lock().await;
        if !self.generation.is_current(ticket) {
            warn!(collection, "discarding documents of a previous selection");
            return Ok(LoadOutcome::Stale);
        }
        if !self.document_requests.is_current(request) {
            warn!(collection, "discarding documents superseded by a newer fetch");
            return Ok(LoadOutcome::Stale);
        }
        state.loading_documents = false;

        let documents = result
            .inspect_err(|e| error!(collection, error = %e, "Failed to fetch documents"))?;
        let count = documents.len();
        state.document_groups = group_by_file(&documents);
        state.documents = documents;
        state.selected_sources = state.available_sources();
        state.sync_pages();

        info!(
            collection,
            documents = count,
            groups = state.document_groups.len(),
            "fetched documents"
        );
        Ok(LoadOutcome::Applied(count))
    }

    /// Loads the chunks of the open collection unless they are cached.
    ///
    /// Loads run one at a time; a caller that had to wait usually finds the
    /// chunks cached. A load that was invalidated while in flight is dropped.
    pub async fn load_chunks(&self) -> Result<LoadOutcome> {
        let _loading = self.chunk_load.lock().await;
        let (collection, ticket, request) = {
            let mut state = self.state.lock().await;
            let Some(collection) = state.selected_collection.clone() else {
                return Ok(LoadOutcome::NoCollection);
            };
            if self.chunk_cache.has(&collection) {
                return Ok(LoadOutcome::Cached);
            }
            state.loading_chunks = true;
            (collection, self.generation.current(), self.chunk_requests.current())
        };

        let result = fetch_all_chunks(&self.client, &collection, &self.fetch).await;

        let mut state = self.state.lock().await;
        if !self.generation.is_current(ticket) {
            warn!(collection, "discarding chunks of a previous selection");
            return Ok(LoadOutcome::Stale);
        }
        state.loading_chunks = false;
        if !self.chunk_requests.is_current(request) {
            warn!(collection, "discarding chunks invalidated while loading");
            return Ok(LoadOutcome::Stale);
        }

        let chunks =
            result.inspect_err(|e| error!(collection, error = %e, "Failed to load chunks"))?;
        let count = chunks.len();
        state.chunks = chunks;
        state.sync_pages();
        self.chunk_cache.mark_loaded(&collection);
        Ok(LoadOutcome::Applied(count))
    }

    /// Switches tabs. The first switch to the chunks tab loads the chunks.
    pub async fn set_active_tab(&self, tab: ActiveTab) -> Result<Option<LoadOutcome>> {
        {
            let mut state = self.state.lock().await;
            state.active_tab = tab;
            state.sync_pages();
        }
        match tab {
            ActiveTab::Chunks => self.load_chunks().await.map(Some),
            ActiveTab::Documents => Ok(None),
        }
    }

    /// Re-fetches documents and drops the chunk cache entry; chunks are
    /// reloaded right away when their tab is active.
    pub async fn refresh(&self) -> Result<()> {
        let (collection, tab) = {
            let state = self.state.lock().await;
            (state.selected_collection.clone(), state.active_tab)
        };
        let Some(collection) = collection else {
            return Ok(());
        };

        self.chunk_requests.advance();
        self.chunk_cache.invalidate(&collection);
        self.fetch_documents().await?;
        if tab == ActiveTab::Chunks {
            self.load_chunks().await?;
        }
        Ok(())
    }

    pub async fn set_selected_sources(&self, sources: Vec<String>) {
        let mut state = self.state.lock().await;
        state.selected_sources = sources;
        state.sync_pages();
    }

    pub async fn go_to_page(&self, page: usize) {
        self.state.lock().await.active_pagination_mut().go_to_page(page);
    }

    pub async fn next_page(&self) {
        self.state.lock().await.active_pagination_mut().next_page();
    }

    pub async fn previous_page(&self) {
        self.state.lock().await.active_pagination_mut().previous_page();
    }

    pub async fn toggle_selection(&self, id: &str) {
        self.state.lock().await.active_selection_mut().toggle(id);
    }

    /// Selects every row of the current page.
    pub async fn select_page(&self) {
        let mut state = self.state.lock().await;
        let ids = state.page_ids();
        state.active_selection_mut().select_all(ids.iter().map(String::as_str));
    }

    pub async fn deselect_page(&self) {
        let mut state = self.state.lock().await;
        let ids = state.page_ids();
        state.active_selection_mut().deselect_all(ids.iter().map(String::as_str));
    }

    /// Deletes the active tab's selection. Returns how many ids were sent, or
    /// `None` when there was nothing to delete.
    pub async fn delete_selected(&self) -> Result<Option<usize>> {
        let (collection, request) = {
            let state = self.state.lock().await;
            let Some(collection) = state.selected_collection.clone() else {
                return Ok(None);
            };
            let ids = state.active_selection().ids().to_vec();
            if ids.is_empty() {
                return Ok(None);
            }
            (collection, DeleteRequest::for_tab(state.active_tab, ids))
        };

        self.client
            .delete_documents(&collection, &request)
            .await
            .inspect_err(|e| error!(collection, error = %e, "Failed to delete documents"))?;

        let count = request.ids().len();
        info!(collection, deleted = count, "deleted documents");
        {
            let mut state = self.state.lock().await;
            state.selected_documents.clear();
            state.selected_chunks.clear();
        }
        self.refresh().await?;
        Ok(Some(count))
    }

    /// Sets the verified or vulnerable flag of one chunk, then refreshes.
    pub async fn set_flag(&self, document_id: &str, flag: DocumentFlag, value: bool) -> Result<()> {
        let collection = {
            let mut state = self.state.lock().await;
            let Some(collection) = state.selected_collection.clone() else {
                return Err(BackendError::Validation("No collection selected".into()));
            };
            state.pending_flags.insert(document_id.to_string());
            collection
        };

        let result = self
            .client
            .set_flag(&collection, document_id, flag, value)
            .await;

        self.state.lock().await.pending_flags.remove(document_id);

        result.inspect_err(|e| {
            error!(collection, document_id, flag = flag.field(), error = %e, "Failed to update flag")
        })?;
        info!(collection, document_id, flag = flag.field(), value, "updated flag");
        self.refresh().await
    }

    /// Renames a collection and replaces its metadata with the given JSON text.
    pub async fn update_collection(
        &self,
        uuid: &str,
        name: &str,
        metadata_text: &str,
    ) -> Result<Collection> {
        if name.trim().is_empty() {
            return Err(BackendError::Validation("Collection name is required".into()));
        }
        let metadata = parse_metadata_json(metadata_text)?;

        let updated = self
            .client
            .update_collection(uuid, name, metadata)
            .await
            .inspect_err(|e| error!(collection = uuid, error = %e, "Failed to update collection"))?;

        info!(collection = uuid, "updated collection");
        self.fetch_collections().await?;
        Ok(updated)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.client
            .sign_out()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to sign out"))?;
        self.generation.advance();
        self.chunk_cache.clear();
        let mut state = self.state.lock().await;
        state.collections.clear();
        state.selected_collection = None;
        state.clear_data();
        Ok(())
    }

    /// Writes the source-filtered chunks of the open collection to `path`.
    pub async fn export_chunks(&self, path: &Path) -> anyhow::Result<usize> {
        self.load_chunks().await.context("Failed to load chunks")?;

        let chunks = {
            let state = self.state.lock().await;
            filter_by_source(&state.chunks, &state.selected_sources)
        };
        export::export_chunks(&chunks, path)
            .inspect_err(|e| error!(error = %e, "Export failed"))
            .context("Excel export failed")?;
        Ok(chunks.len())
    }
}
