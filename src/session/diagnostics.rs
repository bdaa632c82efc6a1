use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

/// Failure classes of the pipeline. None of them is fatal; each degrades to an
/// empty or placeholder state plus a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Directory listing fetch or parse failed; the directory is empty
    DirectoryUnavailable,
    /// Raw export fetch failed; the payload is cleared
    ExportUnavailable,
    /// Attachment has no archive entry (or no archive at all)
    AttachmentMissing,
    /// Attachment entry exists but could not be extracted
    AttachmentUnreadable,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::DirectoryUnavailable => "directory-unavailable",
            DiagnosticKind::ExportUnavailable => "export-unavailable",
            DiagnosticKind::AttachmentMissing => "attachment-missing",
            DiagnosticKind::AttachmentUnreadable => "attachment-unreadable",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub cause: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), cause: None }
    }

    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

/// Side channel for reported failures (message plus optional cause)
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that only logs through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let cause = diagnostic.cause.as_deref().unwrap_or("");
        match diagnostic.kind {
            DiagnosticKind::DirectoryUnavailable | DiagnosticKind::AttachmentMissing => {
                warn!(kind = %diagnostic.kind, cause, "{}", diagnostic.message);
            }
            DiagnosticKind::ExportUnavailable | DiagnosticKind::AttachmentUnreadable => {
                error!(kind = %diagnostic.kind, cause, "{}", diagnostic.message);
            }
        }
    }
}

/// Sink that keeps every diagnostic in memory, for the status bar and for tests
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Diagnostic> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        debug!(kind = %diagnostic.kind, "{}", diagnostic);
        self.entries.lock().push(diagnostic);
    }
}
