//! Terminal crate: sub-modules.

pub mod types;
pub mod codec;
pub mod transcript;
pub mod history;
pub mod reformat;
pub mod port;
pub mod session;
pub mod service;

// Re-export top-level items for convenience.
pub use types::*;
pub use service::{TerminalService, TerminalServiceState};
