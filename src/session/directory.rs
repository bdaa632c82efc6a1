use tracing::{info, warn};

use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use super::fetch::Fetcher;
use crate::parsers::parse_listing;
use crate::utils::ChatPaths;

/// Conversation identifiers in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationDirectory {
    identifiers: Vec<String>,
}

impl ConversationDirectory {
    pub fn new(identifiers: Vec<String>) -> Self {
        Self { identifiers }
    }

    /// Keep folders carrying the conversation marker and strip it.
    ///
    /// Empty identifiers are dropped since `""` means "nothing selected".
    pub fn from_folders(paths: &ChatPaths, folders: &[String]) -> Self {
        let identifiers = folders
            .iter()
            .filter_map(|folder| paths.identifier_from_folder(folder))
            .filter(|id| !id.is_empty())
            .collect();
        Self { identifiers }
    }

    pub fn first(&self) -> Option<&str> {
        self.identifiers.first().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.identifiers.iter().any(|candidate| candidate == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.identifiers.iter().position(|candidate| candidate == id)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.identifiers.get(index).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// The directory is read once; consumers branch on this instead of blocking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DirectoryState {
    #[default]
    Pending,
    Ready(ConversationDirectory),
}

impl DirectoryState {
    pub fn ready(&self) -> Option<&ConversationDirectory> {
        match self {
            DirectoryState::Ready(directory) => Some(directory),
            DirectoryState::Pending => None,
        }
    }
}

/// Fetch the server's directory listing and extract conversation identifiers.
///
/// Never fails: an unreachable or malformed listing reports a
/// [`DiagnosticKind::DirectoryUnavailable`] diagnostic and yields an empty directory.
pub async fn list_conversations<F: Fetcher>(
    fetcher: &F,
    paths: &ChatPaths,
    sink: &dyn DiagnosticSink,
) -> ConversationDirectory {
    let body = match fetcher.fetch(paths.listing_path()).await {
        Ok(body) => body,
        Err(e) => {
            sink.report(
                Diagnostic::new(
                    DiagnosticKind::DirectoryUnavailable,
                    "Failed to fetch chat directory listing",
                )
                .with_cause(e),
            );
            return ConversationDirectory::default();
        }
    };

    let folders = parse_listing(&String::from_utf8_lossy(&body));
    let directory = ConversationDirectory::from_folders(paths, &folders);

    if directory.is_empty() {
        warn!(
            prefix = %paths.config().folder_prefix,
            listing = %paths.listing_path(),
            "No chat folders found in directory listing or folders do not match prefix"
        );
    } else {
        info!(conversations = directory.len(), "Loaded conversation directory");
    }
    directory
}
