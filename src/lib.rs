//! Chat Export Viewer - browse exported WhatsApp conversations served as static folders
//!
//! The export server (any static host with an autoindex, or a local directory) holds one
//! folder per conversation, named with a fixed marker followed by the conversation's
//! identifier. Inside sits the export itself, as plain text or as a zip archive with the
//! media files. This library provides:
//!
//! - Identifier codec between folder names, client routes and fetch paths
//! - The conversation directory, fetched once per session
//! - Selection driven by explicit choice or by the navigable path (deep links, back/forward)
//! - Export loading with stale-result discard and archive resolution
//! - Derived messages, participants and date bounds, optionally anonymized
//! - Attachment resolution through short-lived in-memory object URLs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chat_export_viewer::session::{HttpFetcher, MemoryHistory, TracingSink, open_session};
//! use chat_export_viewer::utils::ChatPaths;
//!
//! # async fn demo() -> reqwest::Result<()> {
//! let fetcher = HttpFetcher::new("http://localhost:8080")?;
//! let session =
//!     open_session(&fetcher, ChatPaths::default(), MemoryHistory::new("/"), Arc::new(TracingSink))
//!         .await;
//! println!("{}: {} messages", session.current(), session.derivations().messages.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod clipboard;
pub mod filters;
pub mod models;
pub mod parsers;
pub mod session;
pub mod tui;
pub mod utils;

// Re-export commonly used types
pub use models::{DateBounds, Message, Participant};
pub use parsers::parse_messages;
pub use session::{ChatSession, open_session};
pub use utils::ChatPaths;
