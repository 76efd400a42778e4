use records::{ActiveTab, Chunk, DocumentGroup};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub total_characters: usize,
}

/// Summary numbers for the header of the documents page.
///
/// Document and character totals follow the active tab; the chunk total is
/// always taken from `chunks`. When the grouped documents are known they are
/// counted instead of the raw records.
pub fn calculate_stats(
    documents: &[Chunk],
    chunks: &[Chunk],
    tab: ActiveTab,
    groups: Option<&[DocumentGroup]>,
) -> Stats {
    let active = match tab {
        ActiveTab::Documents => documents,
        ActiveTab::Chunks => chunks,
    };

    Stats {
        total_documents: groups.map_or(active.len(), <[DocumentGroup]>::len),
        total_chunks: chunks.len(),
        total_characters: active.iter().map(Chunk::char_count).sum(),
    }
}
