use std::borrow::Cow;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use super::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use super::fetch::{FetchError, Fetcher};
use crate::utils::ChatPaths;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const UTF8_BOM: &str = "\u{feff}";

/// Raw export of exactly one conversation, replaced wholesale on every selection change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExport {
    identifier: String,
    source_path: String,
    bytes: Bytes,
}

impl RawExport {
    pub fn new(identifier: impl Into<String>, source_path: impl Into<String>, bytes: Bytes) -> Self {
        Self { identifier: identifier.into(), source_path: source_path.into(), bytes }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn looks_like_zip(&self) -> bool {
        self.bytes.starts_with(ZIP_MAGIC)
    }

    /// Payload as text (lossy UTF-8, leading BOM removed)
    pub fn as_text(&self) -> Cow<'_, str> {
        match String::from_utf8_lossy(&self.bytes) {
            Cow::Borrowed(s) => Cow::Borrowed(s.strip_prefix(UTF8_BOM).unwrap_or(s)),
            Cow::Owned(s) => match s.strip_prefix(UTF8_BOM) {
                Some(stripped) => Cow::Owned(stripped.to_string()),
                None => Cow::Owned(s),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Pending { identifier: String },
    Ready { identifier: String },
    Failed { identifier: String, error: String },
}

/// A load in flight, handed back on completion so stale results can be recognised.
///
/// Only [`ExportLoader::begin`] issues tickets; each carries a generation that the loader
/// compares against the one it is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub identifier: String,
    /// Export paths to try in order
    pub candidates: Vec<String>,
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Bytes plus the candidate path that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedExport {
    pub path: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Committed,
    Failed,
    /// The initiating identifier is no longer current; nothing was written
    Discarded,
}

/// Sole writer of the raw export slot.
///
/// Every write bumps `revision`, which derived views compare against to know when to
/// recompute. Every `begin` bumps `generation`; only the ticket of the latest `begin` may
/// complete, so a superseded load of the same conversation cannot land either.
#[derive(Debug, Clone)]
pub struct ExportLoader {
    paths: ChatPaths,
    payload: Option<Arc<RawExport>>,
    state: LoadState,
    revision: u64,
    generation: u64,
    outstanding: Option<u64>,
}

impl ExportLoader {
    pub fn new(paths: ChatPaths) -> Self {
        Self {
            paths,
            payload: None,
            state: LoadState::Idle,
            revision: 0,
            generation: 0,
            outstanding: None,
        }
    }

    pub fn payload(&self) -> Option<&Arc<RawExport>> {
        self.payload.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        if self.payload.take().is_some() {
            self.revision += 1;
        }
    }

    /// Start loading `identifier`. The previous payload is cleared right away so nothing
    /// downstream keeps showing the old conversation. The empty identifier only clears.
    pub fn begin(&mut self, identifier: &str) -> Option<LoadTicket> {
        self.clear();
        self.generation += 1;
        if identifier.is_empty() {
            self.outstanding = None;
            self.state = LoadState::Idle;
            return None;
        }
        self.outstanding = Some(self.generation);
        self.state = LoadState::Pending { identifier: identifier.to_string() };
        Some(LoadTicket {
            identifier: identifier.to_string(),
            candidates: self.paths.export_paths(identifier),
            generation: self.generation,
        })
    }

    /// Apply a finished fetch. Tickets from any `begin` but the latest, or for an
    /// identifier other than `current`, are discarded without writing anything.
    pub fn complete(
        &mut self,
        current: &str,
        ticket: LoadTicket,
        result: Result<FetchedExport, FetchError>,
        sink: &dyn DiagnosticSink,
    ) -> LoadOutcome {
        if self.outstanding != Some(ticket.generation) || ticket.identifier != current {
            debug!(
                stale = %ticket.identifier,
                generation = ticket.generation,
                current,
                "Discarding superseded export load"
            );
            return LoadOutcome::Discarded;
        }
        self.outstanding = None;

        match result {
            Ok(fetched) => {
                info!(
                    identifier = %ticket.identifier,
                    path = %fetched.path,
                    bytes = fetched.bytes.len(),
                    "Loaded chat export"
                );
                self.payload =
                    Some(Arc::new(RawExport::new(ticket.identifier.clone(), fetched.path, fetched.bytes)));
                self.revision += 1;
                self.state = LoadState::Ready { identifier: ticket.identifier };
                LoadOutcome::Committed
            }
            Err(e) => {
                self.clear();
                sink.report(
                    Diagnostic::new(
                        DiagnosticKind::ExportUnavailable,
                        format!("Error loading chat file for {}", ticket.identifier),
                    )
                    .with_cause(&e),
                );
                self.state = LoadState::Failed { identifier: ticket.identifier, error: e.to_string() };
                LoadOutcome::Failed
            }
        }
    }
}

/// Try each candidate path in order; the first success wins.
///
/// When every candidate fails, the error of the primary (first) candidate is returned.
pub async fn fetch_export<F: Fetcher>(
    fetcher: &F,
    ticket: &LoadTicket,
) -> Result<FetchedExport, FetchError> {
    let mut first_error = None;
    for path in &ticket.candidates {
        match fetcher.fetch(path).await {
            Ok(bytes) => return Ok(FetchedExport { path: path.clone(), bytes }),
            Err(e) => {
                debug!(%path, error = %e, "Export candidate unavailable");
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or_else(|| FetchError::not_found(&ticket.identifier)))
}
