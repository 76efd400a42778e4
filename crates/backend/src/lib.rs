pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod generation;
pub mod loader;

pub use cache::LoadCache;
pub use client::{BackendClient, parse_metadata_json};
pub use config::{BackendConfig, FetchConfig};
pub use error::{BackendError, Result};
pub use generation::{Generation, Ticket};
pub use loader::{PageSource, fetch_all_chunks, fetch_all_documents};
