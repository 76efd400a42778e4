//! Client-side view logic over fetched chunks: grouping into documents,
//! source filtering, summary statistics, pagination and selection sets.

pub mod filter;
pub mod grouping;
pub mod pagination;
pub mod selection;
pub mod stats;

pub use filter::{HasSource, extract_available_sources, filter_by_source};
pub use grouping::group_by_file;
pub use pagination::Pagination;
pub use selection::Selection;
pub use stats::{Stats, calculate_stats};

#[cfg(test)]
pub(crate) mod fixtures {
    use records::{Chunk, ChunkMetadata};

    pub fn chunk(id: &str, file_id: Option<&str>, source: Option<&str>, content: &str) -> Chunk {
        Chunk::new(
            id,
            content,
            ChunkMetadata {
                file_id: file_id.map(str::to_string),
                source: source.map(str::to_string),
                ..Default::default()
            },
        )
    }
}
