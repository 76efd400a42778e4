pub mod config;
pub mod render;
pub mod session;

pub use config::{ConsoleConfig, ViewConfig};
pub use session::{LoadOutcome, Session, SessionState};
