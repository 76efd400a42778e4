pub mod chunk;
pub mod collection;
pub mod group;
pub mod request;

pub use chunk::{Chunk, ChunkMetadata, NOT_AVAILABLE};
pub use collection::Collection;
pub use group::DocumentGroup;
pub use request::{ActiveTab, ApiEnvelope, DeleteRequest, DocumentFlag};
