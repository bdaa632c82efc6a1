//! Pure views over the committed export: archive, messages, participants, date bounds.
//!
//! Nothing here touches the network or the loader; every function is total over its
//! arguments. [`Derivations`] bundles one consistent set of views tagged with the loader
//! revision it was computed from.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::{debug, warn};

use super::archive::{self, ArchiveHandle};
use super::loader::RawExport;
use crate::models::{DateBounds, Message, Participant};
use crate::parsers::parse_messages;

/// Text the message parser runs over
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportContent<'a> {
    #[default]
    Empty,
    /// Plain-text export
    Text(Cow<'a, str>),
    /// Chat entry read out of a zipped export
    Archived { entry: String, text: String },
}

impl<'a> ExportContent<'a> {
    /// Pick the content source: the archive's chat entry when an archive resolved,
    /// otherwise the payload itself as text.
    pub fn from_export(payload: Option<&'a RawExport>, archive: Option<&ArchiveHandle>) -> Self {
        let Some(payload) = payload else {
            return ExportContent::Empty;
        };
        let Some(archive) = archive else {
            return ExportContent::Text(payload.as_text());
        };

        let preferred = format!("{}.txt", chat_file_stem(payload.source_path()));
        let Some(entry) = archive.chat_entry_name(Some(&preferred)) else {
            warn!(identifier = payload.identifier(), "Archive has no chat text entry");
            return ExportContent::Empty;
        };
        match archive.read_entry(&entry) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let text = text.strip_prefix('\u{feff}').unwrap_or(&text).to_string();
                ExportContent::Archived { entry, text }
            }
            Err(e) => {
                warn!(identifier = payload.identifier(), error = %e, "Failed to read chat entry");
                ExportContent::Empty
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ExportContent::Empty => "",
            ExportContent::Text(text) => text,
            ExportContent::Archived { text, .. } => text,
        }
    }
}

/// `/chats/<folder>/<file>.zip` -> `<file>` (percent-decoded)
fn chat_file_stem(source_path: &str) -> String {
    let file = source_path.rsplit('/').next().unwrap_or_default();
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    crate::utils::decode_component(stem)
}

pub fn messages(content: &ExportContent<'_>, anonymize: bool) -> Vec<Message> {
    parse_messages(content.text(), anonymize)
}

/// Distinct senders in first-appearance order, with message counts
pub fn participants(messages: &[Message]) -> Vec<Participant> {
    let mut order: Vec<Participant> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for sender in messages.iter().filter_map(|m| m.sender.as_deref()) {
        match positions.get(sender) {
            Some(&i) => order[i].message_count += 1,
            None => {
                positions.insert(sender, order.len());
                order.push(Participant { name: sender.to_string(), message_count: 1 });
            }
        }
    }
    order
}

pub fn date_bounds(messages: &[Message]) -> Option<DateBounds> {
    let earliest = messages.iter().map(|m| m.timestamp).min()?;
    let latest = messages.iter().map(|m| m.timestamp).max()?;
    Some(DateBounds { earliest, latest })
}

/// One consistent set of derived views
#[derive(Debug, Clone, Default)]
pub struct Derivations {
    /// Loader revision these views were computed from
    pub revision: u64,
    pub anonymize: bool,
    pub archive: Option<ArchiveHandle>,
    pub messages: Vec<Message>,
    pub participants: Vec<Participant>,
    pub date_bounds: Option<DateBounds>,
}

impl Derivations {
    pub fn compute(payload: Option<&RawExport>, revision: u64, anonymize: bool) -> Self {
        let archive = archive::resolve(payload);
        let content = ExportContent::from_export(payload, archive.as_ref());
        let messages = messages(&content, anonymize);
        let participants = participants(&messages);
        let date_bounds = date_bounds(&messages);

        debug!(
            revision,
            anonymize,
            archived = archive.is_some(),
            messages = messages.len(),
            participants = participants.len(),
            "Recomputed derivations"
        );
        Self { revision, anonymize, archive, messages, participants, date_bounds }
    }

    /// Whether these views still match the given inputs
    pub fn is_current(&self, revision: u64, anonymize: bool) -> bool {
        self.revision == revision && self.anonymize == anonymize
    }
}
