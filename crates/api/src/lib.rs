//! Same-origin proxy in front of the retrieval backend. Every route forwards
//! one call with the caller's bearer token and wraps the answer in
//! `{success, data?, message?}`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;

pub use config::AppConfig;
pub use error::ApiError;
pub use metrics::Metrics;
pub use routes::{AppState, router};
