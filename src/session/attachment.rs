//! Attachment Resolver.
//!
//! An [`AttachmentView`] presents one attachment at a time. Direct URLs are classified
//! and shown as-is. Archive entries are extracted off the UI thread (see
//! [`ExtractRequest::run_blocking`]) and materialized as an [`ObjectUrl`] only when the
//! result still belongs to the view's current file. The view owns that URL until the
//! first of: media loaded, media error, download, or the view moving on / being dropped.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use super::archive::{ArchiveError, ArchiveHandle};
use super::blob::{Blob, BlobStore, ObjectUrl};
use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::models::MediaKind;
use crate::parsers::{media_kind, mime_type_of};

/// Text shown in place of media that can't be displayed
pub const FALLBACK_TEXT: &str = "Unsupported file type or error loading";

const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, PartialEq, Eq)]
pub enum AttachmentSource {
    /// Externally fetchable URL, never released
    Direct(String),
    /// Temporary in-memory URL owned by the view
    Object(ObjectUrl),
}

impl AttachmentSource {
    pub fn url(&self) -> &str {
        match self {
            AttachmentSource::Direct(url) => url,
            AttachmentSource::Object(url) => url.as_str(),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum AttachmentState {
    #[default]
    Idle,
    Pending {
        file_name: String,
    },
    Ready {
        file_name: String,
        kind: MediaKind,
        source: AttachmentSource,
    },
    Unavailable {
        file_name: String,
        reason: String,
    },
}

impl AttachmentState {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            AttachmentState::Idle => None,
            AttachmentState::Pending { file_name }
            | AttachmentState::Ready { file_name, .. }
            | AttachmentState::Unavailable { file_name, .. } => Some(file_name),
        }
    }
}

/// Signals from whatever renders the media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Loaded,
    Error,
    /// Non-media file handed off as a download
    Downloaded,
}

/// Archive extraction to run off the UI thread
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub generation: u64,
    pub file_name: String,
    archive: ArchiveHandle,
}

#[derive(Debug)]
pub struct ExtractOutcome {
    pub generation: u64,
    pub file_name: String,
    pub result: Result<Bytes, ArchiveError>,
}

impl ExtractRequest {
    pub fn run(self) -> ExtractOutcome {
        let result = self.archive.read_entry(&self.file_name);
        ExtractOutcome { generation: self.generation, file_name: self.file_name, result }
    }

    /// [`run`](Self::run) on tokio's blocking pool
    pub async fn run_blocking(self) -> ExtractOutcome {
        let generation = self.generation;
        let file_name = self.file_name.clone();
        match tokio::task::spawn_blocking(move || self.run()).await {
            Ok(outcome) => outcome,
            Err(e) => ExtractOutcome {
                generation,
                file_name: file_name.clone(),
                result: Err(ArchiveError::Decompress {
                    name: file_name,
                    source: std::io::Error::other(e),
                }),
            },
        }
    }
}

pub struct AttachmentView {
    store: BlobStore,
    sink: Arc<dyn DiagnosticSink>,
    generation: u64,
    state: AttachmentState,
}

impl AttachmentView {
    pub fn new(store: BlobStore, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { store, sink, generation: 0, state: AttachmentState::Idle }
    }

    pub fn state(&self) -> &AttachmentState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Show `file_name`. Any object URL held for the previous file is released first.
    ///
    /// Returns an extraction to run when the bytes have to come out of `archive`.
    pub fn resolve(
        &mut self,
        file_name: &str,
        direct_url: Option<&str>,
        archive: Option<&ArchiveHandle>,
    ) -> Option<ExtractRequest> {
        self.generation += 1;
        self.teardown();

        if let Some(url) = direct_url {
            trace!(file_name, url, "Attachment served directly");
            self.state = AttachmentState::Ready {
                file_name: file_name.to_string(),
                kind: media_kind(file_name),
                source: AttachmentSource::Direct(url.to_string()),
            };
            return None;
        }

        let Some(archive) = archive else {
            self.unavailable(
                file_name,
                Diagnostic::new(
                    DiagnosticKind::AttachmentMissing,
                    format!("Cannot display attachment: {file_name}. No archive data found."),
                ),
            );
            return None;
        };

        if !archive.contains(file_name) {
            self.unavailable(
                file_name,
                Diagnostic::new(
                    DiagnosticKind::AttachmentMissing,
                    format!("File not found in archive: {file_name}"),
                ),
            );
            return None;
        }

        self.state = AttachmentState::Pending { file_name: file_name.to_string() };
        Some(ExtractRequest {
            generation: self.generation,
            file_name: file_name.to_string(),
            archive: archive.clone(),
        })
    }

    /// Apply a finished extraction. Results for a superseded request are dropped
    /// without minting a URL.
    pub fn complete(&mut self, outcome: ExtractOutcome) -> bool {
        let current = matches!(
            &self.state,
            AttachmentState::Pending { file_name } if *file_name == outcome.file_name
        );
        if outcome.generation != self.generation || !current {
            debug!(
                file_name = %outcome.file_name,
                generation = outcome.generation,
                "Discarding attachment extraction for a file no longer shown"
            );
            return false;
        }

        let file_name = outcome.file_name;
        match outcome.result {
            Ok(bytes) => {
                let mime = mime_type_of(&file_name).unwrap_or(DEFAULT_MIME);
                let url = self.store.create_object_url(bytes, mime);
                self.state = AttachmentState::Ready {
                    kind: media_kind(&file_name),
                    file_name,
                    source: AttachmentSource::Object(url),
                };
            }
            Err(e) => {
                let diagnostic = Diagnostic::new(
                    DiagnosticKind::AttachmentUnreadable,
                    format!("Error loading attachment {file_name}"),
                )
                .with_cause(&e);
                self.unavailable(&file_name, diagnostic);
            }
        }
        true
    }

    /// Media element feedback. Returns whether an object URL was released.
    pub fn on_media_event(&mut self, event: MediaEvent) -> bool {
        let AttachmentState::Ready { source: AttachmentSource::Object(url), file_name, .. } =
            &mut self.state
        else {
            return false;
        };
        let released = url.release();
        if released {
            trace!(file_name = %file_name, ?event, "Media settled, released object URL");
        }
        released
    }

    /// Bytes behind the current object URL while it is live
    pub fn blob(&self) -> Option<Blob> {
        match &self.state {
            AttachmentState::Ready { source: AttachmentSource::Object(url), .. } => url.blob(),
            _ => None,
        }
    }

    /// Drop whatever is shown; a held object URL is released with it
    pub fn teardown(&mut self) {
        self.state = AttachmentState::Idle;
    }

    fn unavailable(&mut self, file_name: &str, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
        self.state = AttachmentState::Unavailable {
            file_name: file_name.to_string(),
            reason: FALLBACK_TEXT.to_string(),
        };
    }
}
