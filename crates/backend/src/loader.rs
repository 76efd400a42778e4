use async_trait::async_trait;
use futures::future::try_join_all;
use records::Chunk;
use tracing::{debug, info, warn};

use crate::client::BackendClient;
use crate::config::FetchConfig;
use crate::error::{BackendError, Result};

/// Something that serves a collection's chunks one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, collection_id: &str, limit: usize, offset: usize)
    -> Result<Vec<Chunk>>;
}

#[async_trait]
impl PageSource for BackendClient {
    async fn fetch_page(
        &self,
        collection_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Chunk>> {
        self.fetch_documents(collection_id, limit, offset).await
    }
}

/// Loads every chunk of a collection with a probe followed by concurrent
/// continuation requests.
///
/// The continuation requests are only sent when the probe comes back full,
/// and there are at most `max_batches - 1` of them. Batches are appended in
/// offset order, whatever order they resolve in. A single failed request
/// fails the whole load.
pub async fn fetch_all_chunks<S>(
    source: &S,
    collection_id: &str,
    config: &FetchConfig,
) -> Result<Vec<Chunk>>
where
    S: PageSource + ?Sized,
{
    let page_size = config.page_size;
    let probe = source.fetch_page(collection_id, page_size, 0).await?;
    if probe.is_empty() {
        debug!(collection_id, "collection has no chunks");
        return Ok(Vec::new());
    }

    let probe_full = probe.len() == page_size;
    let mut chunks = probe;

    if probe_full && config.max_batches > 1 {
        let requests = (1..config.max_batches)
            .map(|batch| source.fetch_page(collection_id, page_size, batch * page_size));
        let batches = try_join_all(requests).await?;

        for batch in batches.into_iter().filter(|b| !b.is_empty()) {
            chunks.extend(batch);
        }

        if chunks.len() >= config.chunk_capacity() {
            warn!(
                collection_id,
                loaded = chunks.len(),
                max_batches = config.max_batches,
                "chunk load hit the batch limit, collection may be truncated"
            );
        }
    }

    info!(collection_id, chunks = chunks.len(), "loaded chunks");
    Ok(chunks)
}

/// Loads every record of a collection page by page, stopping at the first
/// short page. Gives up with `PageCapReached` after `max_document_pages` full
/// pages.
pub async fn fetch_all_documents<S>(
    source: &S,
    collection_id: &str,
    config: &FetchConfig,
) -> Result<Vec<Chunk>>
where
    S: PageSource + ?Sized,
{
    let page_size = config.page_size;
    let mut documents = Vec::new();

    for page in 0..config.max_document_pages {
        let batch = source
            .fetch_page(collection_id, page_size, page * page_size)
            .await?;
        let short = batch.len() < page_size;
        documents.extend(batch);

        if short {
            info!(collection_id, documents = documents.len(), pages = page + 1, "loaded documents");
            return Ok(documents);
        }
    }

    warn!(
        collection_id,
        pages = config.max_document_pages,
        page_size,
        "document load stopped at page limit"
    );
    Err(BackendError::PageCapReached {
        pages: config.max_document_pages,
        page_size,
    })
}
