//! Pure parsers consumed by the session pipeline
//!
//! - [`listing`] - autoindex HTML into ordered folder names
//! - [`chat`] - exported chat text into [`Message`](crate::models::Message) records
//! - [`mime`] - file names into MIME types and [`MediaKind`](crate::models::MediaKind)
//!
//! None of these fail: malformed input degrades to fewer results. Lines or anchors
//! that cannot be interpreted are skipped and counted in a `tracing` debug event.

pub mod chat;
pub mod listing;
pub mod mime;

pub use chat::{anonymize_senders, parse_messages};
pub use listing::parse_listing;
pub use mime::{media_kind, mime_type_of};
