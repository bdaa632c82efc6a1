//! Wiring of the session pipeline:
//! directory → selection → raw export → archive → messages → participants → date bounds.
//!
//! [`ChatSession`] is the single writer of every slot. It never awaits: operations that
//! need the network hand back a [`LoadTicket`], the caller runs [`fetch_export`] wherever
//! it likes and feeds the result to [`ChatSession::complete_load`]. The async helpers at
//! the bottom do exactly that for callers that can simply await.

use std::sync::Arc;

use tracing::{debug, info};

use super::attachment::{AttachmentView, ExtractRequest};
use super::blob::BlobStore;
use super::derive::Derivations;
use super::diagnostics::DiagnosticSink;
use super::directory::{ConversationDirectory, DirectoryState, list_conversations};
use super::fetch::{FetchError, Fetcher};
use super::loader::{
    ExportLoader, FetchedExport, LoadOutcome, LoadState, LoadTicket, RawExport, fetch_export,
};
use super::navigation::{MemoryHistory, NavigationAdapter};
use super::selection::SelectionController;
use crate::utils::ChatPaths;

pub struct ChatSession<N: NavigationAdapter> {
    paths: ChatPaths,
    navigation: N,
    directory: DirectoryState,
    selection: SelectionController,
    loader: ExportLoader,
    anonymize: bool,
    derivations: Arc<Derivations>,
    store: BlobStore,
    sink: Arc<dyn DiagnosticSink>,
}

impl<N: NavigationAdapter> ChatSession<N> {
    pub fn new(paths: ChatPaths, navigation: N, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            selection: SelectionController::new(paths.clone()),
            loader: ExportLoader::new(paths.clone()),
            paths,
            navigation,
            directory: DirectoryState::Pending,
            anonymize: false,
            derivations: Arc::new(Derivations::default()),
            store: BlobStore::new(),
            sink,
        }
    }

    /// Settle the directory. Only the first call has any effect; the directory is
    /// fetched once per session.
    pub fn install_directory(&mut self, directory: ConversationDirectory) -> Option<LoadTicket> {
        if let DirectoryState::Ready(existing) = &self.directory {
            debug!(conversations = existing.len(), "Directory already installed, ignoring");
            return None;
        }
        self.directory = DirectoryState::Ready(directory);
        self.sync_from_path()
    }

    /// Derive the selection from the navigable path (mount, back/forward).
    /// Does nothing until the directory has settled.
    pub fn sync_from_path(&mut self) -> Option<LoadTicket> {
        let DirectoryState::Ready(directory) = &self.directory else {
            return None;
        };
        if self.selection.derive_from_path(&mut self.navigation, directory) {
            self.on_selection_changed()
        } else {
            None
        }
    }

    /// Explicit user selection
    pub fn select(&mut self, identifier: &str) -> Option<LoadTicket> {
        if self.selection.select(&mut self.navigation, identifier) {
            self.on_selection_changed()
        } else {
            None
        }
    }

    /// Apply a finished export fetch. Results for a conversation that is no longer
    /// selected are discarded.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<FetchedExport, FetchError>,
    ) -> LoadOutcome {
        let outcome =
            self.loader.complete(self.selection.current(), ticket, result, self.sink.as_ref());
        if outcome != LoadOutcome::Discarded {
            self.recompute();
        }
        outcome
    }

    pub fn set_anonymize(&mut self, anonymize: bool) {
        if self.anonymize != anonymize {
            self.anonymize = anonymize;
            self.recompute();
        }
    }

    pub fn toggle_anonymize(&mut self) {
        self.set_anonymize(!self.anonymize);
    }

    pub fn current(&self) -> &str {
        self.selection.current()
    }

    pub fn directory(&self) -> Option<&ConversationDirectory> {
        self.directory.ready()
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    pub fn payload(&self) -> Option<&Arc<RawExport>> {
        self.loader.payload()
    }

    pub fn anonymize(&self) -> bool {
        self.anonymize
    }

    /// Snapshot of the derived views; always computed from the latest committed payload
    pub fn derivations(&self) -> Arc<Derivations> {
        Arc::clone(&self.derivations)
    }

    /// `/chats/<folder>/` for the current selection, `""` when nothing is selected
    pub fn media_base_url(&self) -> String {
        self.paths.media_base_url(self.selection.current())
    }

    pub fn paths(&self) -> &ChatPaths {
        &self.paths
    }

    pub fn navigation(&self) -> &N {
        &self.navigation
    }

    pub fn sink(&self) -> Arc<dyn DiagnosticSink> {
        Arc::clone(&self.sink)
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.store
    }

    pub fn attachment_view(&self) -> AttachmentView {
        AttachmentView::new(self.store.clone(), self.sink())
    }

    /// Resolve `file_name` in `view` against the current archive
    pub fn resolve_attachment(
        &self,
        view: &mut AttachmentView,
        file_name: &str,
        direct_url: Option<&str>,
    ) -> Option<ExtractRequest> {
        view.resolve(file_name, direct_url, self.derivations.archive.as_ref())
    }

    fn on_selection_changed(&mut self) -> Option<LoadTicket> {
        let ticket = self.loader.begin(self.selection.current());
        self.recompute();
        if let Some(ticket) = &ticket {
            info!(identifier = %ticket.identifier, "Loading conversation");
        }
        ticket
    }

    fn recompute(&mut self) {
        let revision = self.loader.revision();
        if self.derivations.is_current(revision, self.anonymize) {
            return;
        }
        let payload = self.loader.payload().map(Arc::as_ref);
        self.derivations = Arc::new(Derivations::compute(payload, revision, self.anonymize));
    }
}

impl ChatSession<MemoryHistory> {
    /// History back, then re-derive. `None` when there is nowhere to go or nothing to load.
    pub fn back(&mut self) -> Option<LoadTicket> {
        self.navigation.back()?;
        self.sync_from_path()
    }

    pub fn forward(&mut self) -> Option<LoadTicket> {
        self.navigation.forward()?;
        self.sync_from_path()
    }
}

/// Fetch the directory, install it and load whatever the path resolves to
pub async fn open_session<F: Fetcher, N: NavigationAdapter>(
    fetcher: &F,
    paths: ChatPaths,
    navigation: N,
    sink: Arc<dyn DiagnosticSink>,
) -> ChatSession<N> {
    let directory = list_conversations(fetcher, &paths, sink.as_ref()).await;
    let mut session = ChatSession::new(paths, navigation, sink);
    if let Some(ticket) = session.install_directory(directory) {
        run_load(&mut session, fetcher, ticket).await;
    }
    session
}

pub async fn run_load<F: Fetcher, N: NavigationAdapter>(
    session: &mut ChatSession<N>,
    fetcher: &F,
    ticket: LoadTicket,
) -> LoadOutcome {
    let result = fetch_export(fetcher, &ticket).await;
    session.complete_load(ticket, result)
}

/// Select `identifier` and wait for its export. `None` when nothing had to be loaded.
pub async fn select_and_load<F: Fetcher, N: NavigationAdapter>(
    session: &mut ChatSession<N>,
    fetcher: &F,
    identifier: &str,
) -> Option<LoadOutcome> {
    let ticket = session.select(identifier)?;
    Some(run_load(session, fetcher, ticket).await)
}
