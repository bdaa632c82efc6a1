//! Session pipeline: everything between the export server and a rendered conversation.
//!
//! Data flows one way:
//!
//! ```text
//! listing ─▶ directory ─▶ selection ◀─▶ navigation
//!                            │
//!                            ▼
//!                      raw export ─▶ archive ─▶ messages ─▶ participants ─▶ date bounds
//!                                      │
//!                                      ▼
//!                                 attachments
//! ```
//!
//! Every slot has exactly one writer ([`ChatSession`]); derived views are recomputed from
//! scratch whenever the committed export or the anonymize flag changes.

pub mod archive;
pub mod attachment;
pub mod blob;
pub mod derive;
pub mod diagnostics;
pub mod directory;
pub mod fetch;
pub mod loader;
pub mod navigation;
pub mod pipeline;
pub mod selection;

pub use archive::{ArchiveError, ArchiveHandle};
pub use attachment::{
    AttachmentSource, AttachmentState, AttachmentView, ExtractOutcome, ExtractRequest,
    FALLBACK_TEXT, MediaEvent,
};
pub use blob::{Blob, BlobStore, ObjectUrl};
pub use derive::Derivations;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, TracingSink};
pub use directory::{ConversationDirectory, DirectoryState, list_conversations};
pub use fetch::{FetchError, Fetcher, HttpFetcher, LocalFetcher, ServerFetcher};
pub use loader::{ExportLoader, FetchedExport, LoadOutcome, LoadState, LoadTicket, RawExport, fetch_export};
pub use navigation::{HistoryEntry, MemoryHistory, NavigationAdapter};
pub use pipeline::{ChatSession, open_session, run_load, select_and_load};
pub use selection::SelectionController;
