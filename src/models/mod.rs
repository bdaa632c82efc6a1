//! Data models for exported chat conversations.
//!
//! - [`Message`] - One parsed entry of a chat export
//! - [`Participant`] - Distinct sender derived from the message sequence
//! - [`DateBounds`] - Earliest and latest message timestamps
//! - [`MediaKind`] - Rendering category of an attachment
//! - [`ViewerConfig`] - Folder and routing prefixes shared by every component

pub mod config;
pub mod media;
pub mod message;

pub use config::ViewerConfig;
pub use media::MediaKind;
pub use message::{DateBounds, Message, Participant};
