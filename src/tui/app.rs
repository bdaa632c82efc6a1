//! TUI application state and event handling.
//!
//! The `App` owns a [`ChatSession`] and is its only writer. Network work (export loads,
//! attachment extraction) runs on a tokio runtime; results come back over a channel and
//! are applied on the UI thread at the top of every loop iteration, so the session sees
//! one writer even though fetches overlap.
//!
//! Input syntax in the filter line: `filter_expr | fuzzy_query` where:
//! - Filter portion (left of `|`): applied when Enter is pressed, reduces the message set
//! - Fuzzy portion (right of `|`): real-time fuzzy matching via nucleo

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use nucleo::{Config, Nucleo};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

use super::events::{Action, poll_event};
use super::rendering::{RenderState, render_ui};
use crate::clipboard::copy_message;
use crate::filters::{FilterExpr, FilterMode, MessageWindow, apply_filters, parse_filter};
use crate::models::Message;
use crate::session::{
    AttachmentState, AttachmentView, ChatSession, ExtractOutcome, ExtractRequest, FetchError,
    FetchedExport, Fetcher, LoadOutcome, LoadState, LoadTicket, MediaEvent, MemoryHistory,
    RecordingSink, fetch_export,
};

/// Duration for success status messages (milliseconds)
const STATUS_SUCCESS_DURATION_MS: u64 = 3000;
/// Duration for error status messages (milliseconds)
const STATUS_ERROR_DURATION_MS: u64 = 5000;
const MAX_QUERY_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Success,
    Error,
}

/// Transient status message with expiry
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub message_type: MessageType,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Conversations,
    Messages,
}

/// Results of background work, applied on the UI thread
#[derive(Debug)]
enum Completion {
    Load { ticket: LoadTicket, result: Result<FetchedExport, FetchError> },
    Extract(ExtractOutcome),
}

pub struct App<F: Fetcher + Clone + 'static> {
    session: ChatSession<MemoryHistory>,
    diagnostics: RecordingSink,
    seen_diagnostics: usize,
    fetcher: F,
    runtime: Handle,
    completions_tx: UnboundedSender<Completion>,
    completions: UnboundedReceiver<Completion>,
    in_flight: usize,
    focus: Focus,
    editing: bool,
    /// The input line holds the window rather than the search query
    editing_window: bool,
    window_input: String,
    conversation_idx: usize,
    selected_idx: usize,
    search_query: String,
    window: MessageWindow,
    current_filter: Option<FilterExpr>,
    filter_error: Option<String>,
    active_user: Option<String>,
    nucleo: Nucleo<Message>,
    filtered_count: usize,
    /// (loader revision, anonymize) the message list was built from
    shown: Option<(u64, bool)>,
    attachment: AttachmentView,
    /// Message index whose attachment the panel shows
    attachment_for: Option<usize>,
    media_info: Option<String>,
    status_message: Option<StatusMessage>,
    should_quit: bool,
    needs_redraw: bool,
    last_draw_time: Instant,
}

impl<F: Fetcher + Clone + 'static> App<F> {
    /// `diagnostics` must be the sink the session reports into
    pub fn new(
        session: ChatSession<MemoryHistory>,
        diagnostics: RecordingSink,
        fetcher: F,
        runtime: Handle,
    ) -> Self {
        let (completions_tx, completions) = unbounded_channel();
        let attachment = session.attachment_view();
        let mut app = Self {
            session,
            seen_diagnostics: diagnostics.len(),
            diagnostics,
            fetcher,
            runtime,
            completions_tx,
            completions,
            in_flight: 0,
            focus: Focus::Messages,
            editing: false,
            editing_window: false,
            window_input: String::new(),
            conversation_idx: 0,
            selected_idx: 0,
            search_query: String::new(),
            window: MessageWindow::default(),
            current_filter: None,
            filter_error: None,
            active_user: None,
            nucleo: new_matcher(),
            filtered_count: 0,
            shown: None,
            attachment,
            attachment_for: None,
            media_info: None,
            status_message: None,
            should_quit: false,
            needs_redraw: true,
            last_draw_time: Instant::now(),
        };
        app.sync_conversation_cursor();
        app.refresh_messages();
        app
    }

    /// Restrict the message list to an index or date window
    pub fn with_window(mut self, window: MessageWindow) -> Self {
        self.window = window;
        self.shown = None;
        self.refresh_messages();
        self
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            self.drain_completions();
            self.surface_diagnostics();
            self.check_and_clear_expired_status();
            self.nucleo.tick(10);

            let now = Instant::now();
            if self.needs_redraw || now.duration_since(self.last_draw_time) >= Duration::from_millis(100)
            {
                let matched = self.collect_matched_items();
                let derived = self.session.derivations();
                let conversations =
                    self.session.directory().map(|d| d.as_slice().to_vec()).unwrap_or_default();
                terminal.draw(|f| {
                    let state = RenderState {
                        conversations: &conversations,
                        current: self.session.current(),
                        conversation_idx: self.conversation_idx,
                        focus: self.focus,
                        load_label: self.load_label(),
                        messages: &matched,
                        selected_idx: self.selected_idx,
                        total_count: derived.messages.len(),
                        participants: &derived.participants,
                        date_bounds: derived.date_bounds,
                        anonymize: self.session.anonymize(),
                        active_user: self.active_user.as_deref(),
                        attachment_lines: self.attachment_lines(),
                        search_query: &self.search_query,
                        window: window_label(&self.window),
                        window_input: self.editing_window.then_some(self.window_input.as_str()),
                        editing: self.editing,
                        filter_error: self.filter_error.as_deref(),
                        status_message: self.status_message.as_ref(),
                        today: Local::now().date_naive(),
                    };
                    render_ui(f, &state);
                })?;
                self.needs_redraw = false;
                self.last_draw_time = now;
            }

            let action = poll_event(Duration::from_millis(100), self.editing)?;
            self.handle_action(action);
        }
        Ok(())
    }

    fn collect_matched_items(&self) -> Vec<&Message> {
        let snapshot = self.nucleo.snapshot();
        snapshot.matched_items(..snapshot.matched_item_count()).map(|item| item.data).collect()
    }

    fn selected_message(&self) -> Option<Message> {
        self.collect_matched_items().get(self.selected_idx).map(|m| (*m).clone())
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Escape => {
                if self.editing_window {
                    self.editing = false;
                    self.editing_window = false;
                    self.needs_redraw = true;
                } else if self.editing {
                    self.editing = false;
                    self.needs_redraw = true;
                } else if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.update_nucleo_pattern();
                    self.apply_filter();
                } else {
                    self.should_quit = true;
                }
            }
            Action::MoveUp => self.move_cursor(-1),
            Action::MoveDown => self.move_cursor(1),
            Action::PageUp => self.move_cursor(-10),
            Action::PageDown => self.move_cursor(10),
            Action::Enter => {
                if self.editing_window {
                    self.apply_window();
                } else if self.editing {
                    self.editing = false;
                    self.apply_filter();
                } else if self.focus == Focus::Conversations {
                    self.open_focused_conversation();
                }
            }
            Action::CopyToClipboard => self.copy_selected(),
            Action::StartFilter => {
                self.editing = true;
                self.editing_window = false;
                self.needs_redraw = true;
            }
            Action::EditWindow => {
                self.editing = true;
                self.editing_window = true;
                self.window_input = self.window.to_string();
                self.needs_redraw = true;
            }
            Action::ToggleWindowMode => self.toggle_window_mode(),
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Conversations => Focus::Messages,
                    Focus::Messages => Focus::Conversations,
                };
                self.needs_redraw = true;
            }
            Action::Back => {
                let ticket = self.session.back();
                self.after_navigation(ticket);
            }
            Action::Forward => {
                let ticket = self.session.forward();
                self.after_navigation(ticket);
            }
            Action::ToggleAnonymize => {
                self.session.toggle_anonymize();
                let label = if self.session.anonymize() { "on" } else { "off" };
                self.set_status(
                    format!("Anonymize {label}"),
                    MessageType::Success,
                    STATUS_SUCCESS_DURATION_MS,
                );
                self.refresh_messages();
            }
            Action::CycleActiveUser => self.cycle_active_user(),
            Action::InputChar(c) if self.editing_window => {
                if self.window_input.len() < MAX_QUERY_LEN {
                    self.window_input.push(c);
                    self.needs_redraw = true;
                }
            }
            Action::DeleteChar if self.editing_window => {
                self.window_input.pop();
                self.needs_redraw = true;
            }
            Action::InputChar(c) => self.update_search(c),
            Action::DeleteChar => self.delete_char(),
            Action::None => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let (idx, total) = match self.focus {
            Focus::Conversations => (
                &mut self.conversation_idx,
                self.session.directory().map_or(0, |d| d.len()),
            ),
            Focus::Messages => (&mut self.selected_idx, self.filtered_count),
        };
        let old = *idx;
        *idx = if total == 0 { 0 } else { idx.saturating_add_signed(delta).min(total - 1) };
        if old != *idx {
            self.needs_redraw = true;
            if self.focus == Focus::Messages {
                self.update_attachment();
            }
        }
    }

    fn open_focused_conversation(&mut self) {
        let Some(target) = self
            .session
            .directory()
            .and_then(|d| d.get(self.conversation_idx))
            .map(str::to_string)
        else {
            return;
        };
        if let Some(ticket) = self.session.select(&target) {
            self.dispatch_load(ticket);
        }
        self.focus = Focus::Messages;
        self.refresh_messages();
    }

    fn after_navigation(&mut self, ticket: Option<LoadTicket>) {
        if let Some(ticket) = ticket {
            self.dispatch_load(ticket);
        }
        self.sync_conversation_cursor();
        self.refresh_messages();
    }

    fn sync_conversation_cursor(&mut self) {
        if let Some(position) =
            self.session.directory().and_then(|d| d.position(self.session.current()))
        {
            self.conversation_idx = position;
        }
        self.needs_redraw = true;
    }

    fn dispatch_load(&mut self, ticket: LoadTicket) {
        self.in_flight += 1;
        let fetcher = self.fetcher.clone();
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let result = fetch_export(&fetcher, &ticket).await;
            // Receiver gone means the app is shutting down
            let _ = tx.send(Completion::Load { ticket, result });
        });
    }

    fn dispatch_extract(&mut self, request: ExtractRequest) {
        self.in_flight += 1;
        let tx = self.completions_tx.clone();
        self.runtime.spawn(async move {
            let outcome = request.run_blocking().await;
            let _ = tx.send(Completion::Extract(outcome));
        });
    }

    fn drain_completions(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.apply_completion(completion);
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Load { ticket, result } => {
                let outcome = self.session.complete_load(ticket, result);
                debug!(?outcome, "Applied export load");
                if outcome != LoadOutcome::Discarded {
                    self.refresh_messages();
                }
            }
            Completion::Extract(outcome) => {
                if self.attachment.complete(outcome) {
                    self.present_attachment();
                }
            }
        }
        self.needs_redraw = true;
    }

    /// Rebuild the visible message list when the derived views changed
    fn refresh_messages(&mut self) {
        let derived = self.session.derivations();
        let key = (derived.revision, derived.anonymize);
        if self.shown == Some(key) {
            return;
        }
        self.shown = Some(key);

        if let Some(user) = &self.active_user
            && !derived.participants.iter().any(|p| &p.name == user)
        {
            self.active_user = None;
        }
        self.re_inject_messages();
    }

    /// Re-inject window- and filter-matched messages into the fuzzy matcher
    fn re_inject_messages(&mut self) {
        let derived = self.session.derivations();
        let windowed: Vec<Message> = self.window.apply(&derived.messages).into_iter().cloned().collect();
        let filtered = match &self.current_filter {
            Some(filter) => apply_filters(windowed, filter).unwrap_or_default(),
            None => windowed,
        };

        self.nucleo = new_matcher();
        let injector = self.nucleo.injector();
        for message in &filtered {
            let haystack = match &message.sender {
                Some(sender) => format!("{sender}: {}", message.body),
                None => message.body.clone(),
            };
            injector.push(message.clone(), move |_message, cols| {
                cols[0] = haystack.into();
            });
        }
        self.filtered_count = filtered.len();
        self.update_nucleo_pattern();
        self.selected_idx = 0;
        self.needs_redraw = true;
        self.update_attachment();
    }

    fn update_search(&mut self, c: char) {
        if self.search_query.len() < MAX_QUERY_LEN {
            self.search_query.push(c);
            self.update_nucleo_pattern();
            self.selected_idx = 0;
            self.needs_redraw = true;
        }
    }

    fn delete_char(&mut self) {
        if self.search_query.pop().is_some() {
            self.update_nucleo_pattern();
            self.selected_idx = 0;
            self.needs_redraw = true;
        }
    }

    fn update_nucleo_pattern(&mut self) {
        let fuzzy_query = self.parse_input().1.to_string();
        self.nucleo.pattern.reparse(
            0,
            &fuzzy_query,
            nucleo::pattern::CaseMatching::Smart,
            nucleo::pattern::Normalization::Smart,
            false,
        );
        self.nucleo.tick(10);
        self.filtered_count = self.nucleo.snapshot().matched_item_count() as usize;
    }

    /// Split the input into (filter portion, fuzzy portion)
    fn parse_input(&self) -> (Option<&str>, &str) {
        if let Some(pipe_pos) = self.search_query.find('|') {
            let filter_part = self.search_query[..pipe_pos].trim();
            let fuzzy_part = self.search_query[pipe_pos + 1..].trim();
            let filter = if filter_part.is_empty() { None } else { Some(filter_part) };
            (filter, fuzzy_part)
        } else {
            (None, self.search_query.as_str())
        }
    }

    fn apply_filter(&mut self) {
        let filter = match self.parse_input().0.map(parse_filter) {
            None => None,
            Some(Ok(expr)) => Some(expr),
            Some(Err(e)) => {
                self.filter_error =
                    Some(format!("Parse error: {e} | Try: from:name has:media | search"));
                self.needs_redraw = true;
                return;
            }
        };
        self.current_filter = filter;
        self.filter_error = None;
        self.re_inject_messages();
    }

    fn apply_window(&mut self) {
        self.editing = false;
        self.editing_window = false;
        match MessageWindow::parse(&self.window_input) {
            Ok(window) => {
                self.window = window;
                self.filter_error = None;
                self.set_status(
                    format!("Window: {}", window_label(&self.window)),
                    MessageType::Success,
                    STATUS_SUCCESS_DURATION_MS,
                );
                self.re_inject_messages();
            }
            Err(e) => {
                self.filter_error =
                    Some(format!("Window error: {e} | Try: 10-50 or 2024-01-01..2024-01-31"));
                self.needs_redraw = true;
            }
        }
    }

    /// Index mode goes to a date window over the whole conversation; date mode goes back
    /// to an unbounded index window
    fn toggle_window_mode(&mut self) {
        self.window = match self.window.mode {
            FilterMode::Index => MessageWindow::spanning(self.session.derivations().date_bounds),
            FilterMode::Date => MessageWindow::default(),
        };
        self.set_status(
            format!("Window: {}", window_label(&self.window)),
            MessageType::Success,
            STATUS_SUCCESS_DURATION_MS,
        );
        self.re_inject_messages();
    }

    fn cycle_active_user(&mut self) {
        let derived = self.session.derivations();
        let names: Vec<&str> = derived.participants.iter().map(|p| p.name.as_str()).collect();
        let next = match &self.active_user {
            None => names.first().copied(),
            Some(current) => names
                .iter()
                .position(|name| *name == current.as_str())
                .and_then(|i| names.get(i + 1).copied()),
        };
        self.active_user = next.map(str::to_string);
        self.needs_redraw = true;
    }

    fn copy_selected(&mut self) {
        let Some(message) = self.selected_message() else {
            self.set_status("✗ No message to copy", MessageType::Error, STATUS_ERROR_DURATION_MS);
            return;
        };
        match copy_message(&message) {
            Ok(()) => self.set_status(
                "✓ Copied to clipboard",
                MessageType::Success,
                STATUS_SUCCESS_DURATION_MS,
            ),
            Err(e) => self.set_status(
                format!("✗ Clipboard error: {e}"),
                MessageType::Error,
                STATUS_ERROR_DURATION_MS,
            ),
        }
    }

    /// Point the attachment panel at the selected message's file, if any
    fn update_attachment(&mut self) {
        let selected = self.selected_message();
        let Some((index, file_name)) =
            selected.and_then(|m| m.attachment.map(|file| (m.index, file)))
        else {
            if self.attachment_for.take().is_some() {
                self.attachment.teardown();
                self.media_info = None;
            }
            return;
        };
        if self.attachment_for == Some(index) {
            return;
        }
        self.attachment_for = Some(index);
        self.media_info = None;

        // Plain-text exports keep media next to the chat file on the server
        let derived = self.session.derivations();
        let direct_url = derived
            .archive
            .is_none()
            .then(|| self.session.paths().attachment_url(self.session.current(), &file_name));
        let request =
            self.session.resolve_attachment(&mut self.attachment, &file_name, direct_url.as_deref());
        if let Some(request) = request {
            self.dispatch_extract(request);
        }
        self.needs_redraw = true;
    }

    /// Read the extracted bytes for the panel, then let the URL go
    fn present_attachment(&mut self) {
        if let AttachmentState::Ready { kind, .. } = self.attachment.state() {
            let event = if kind.is_playable() { MediaEvent::Loaded } else { MediaEvent::Downloaded };
            if let Some(blob) = self.attachment.blob() {
                self.media_info = Some(format!("{}, {} bytes", blob.mime, blob.bytes.len()));
            }
            self.attachment.on_media_event(event);
        }
    }

    fn attachment_lines(&self) -> Vec<String> {
        match self.attachment.state() {
            AttachmentState::Idle => Vec::new(),
            AttachmentState::Pending { file_name } => vec![format!("Loading {file_name}...")],
            AttachmentState::Ready { file_name, kind, source } => {
                let mut lines = vec![format!("{} ({})", file_name, kind.label())];
                match &self.media_info {
                    Some(info) => lines.push(info.clone()),
                    None => lines.push(source.url().to_string()),
                }
                lines
            }
            AttachmentState::Unavailable { file_name, reason } => {
                vec![format!("{reason}:"), file_name.clone()]
            }
        }
    }

    fn load_label(&self) -> Option<String> {
        match self.session.load_state() {
            LoadState::Pending { .. } => Some("loading".to_string()),
            LoadState::Failed { .. } => Some("unavailable".to_string()),
            LoadState::Idle | LoadState::Ready { .. } => None,
        }
    }

    /// Show the newest diagnostic the session reported since the last check
    fn surface_diagnostics(&mut self) {
        let count = self.diagnostics.len();
        if count > self.seen_diagnostics {
            self.seen_diagnostics = count;
            if let Some(diagnostic) = self.diagnostics.last() {
                self.set_status(
                    format!("✗ {}", diagnostic.message),
                    MessageType::Error,
                    STATUS_ERROR_DURATION_MS,
                );
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, message_type: MessageType, duration_ms: u64) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            message_type,
            expires_at: Instant::now() + Duration::from_millis(duration_ms),
        });
        self.needs_redraw = true;
    }

    fn check_and_clear_expired_status(&mut self) {
        if self.status_message.as_ref().is_some_and(|msg| Instant::now() >= msg.expires_at) {
            self.status_message = None;
            self.needs_redraw = true;
        }
    }

    /// Block until background work settles (or `timeout` passes), applying results
    #[cfg(test)]
    fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let completions = &mut self.completions;
            let next = self.runtime.block_on(async move {
                tokio::time::timeout(remaining, completions.recv()).await
            });
            match next {
                Ok(Some(completion)) => self.apply_completion(completion),
                Ok(None) | Err(_) => return false,
            }
        }
        self.surface_diagnostics();
        true
    }
}

fn window_label(window: &MessageWindow) -> String {
    if window.is_unbounded() { "all".to_string() } else { window.to_string() }
}

fn new_matcher() -> Nucleo<Message> {
    Nucleo::new(Config::DEFAULT, Arc::new(|| {}), None, 1)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::NaiveDate;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;

    use super::*;
    use crate::session::archive::test_support::zip_bytes;
    use crate::session::{LocalFetcher, NavigationAdapter, open_session};
    use crate::utils::ChatPaths;

    const ALICE: &str = "\
12/01/2024, 10:00 - Alice: hi
12/01/2024, 10:01 - Me: hello
13/01/2024, 09:00 - Alice: IMG-0001.jpg (file attached)";

    const BOB: &str = "\
14/01/2024, 08:00 - Bob: cat.jpg (file attached)
14/01/2024, 08:05 - Me: cute
15/01/2024, 21:00 - Bob: bye";

    fn write_exports(root: &Path) {
        let alice = root.join("WhatsApp Chat with Alice");
        std::fs::create_dir(&alice).unwrap();
        std::fs::write(alice.join("WhatsApp Chat with Alice.txt"), ALICE).unwrap();

        let bob = root.join("WhatsApp Chat with Bob");
        std::fs::create_dir(&bob).unwrap();
        let zip = zip_bytes(&[("_chat.txt", BOB.as_bytes()), ("cat.jpg", b"\xff\xd8\xff\xe0")]);
        std::fs::write(bob.join("WhatsApp Chat with Bob.zip"), zip).unwrap();
    }

    struct Fixture {
        root: TempDir,
        runtime: Runtime,
        app: App<LocalFetcher>,
    }

    fn fixture(start_path: &str) -> Fixture {
        let root = TempDir::new().unwrap();
        write_exports(root.path());
        let runtime = Runtime::new().unwrap();
        let fetcher = LocalFetcher::new(root.path(), "/chats/");
        let sink = RecordingSink::new();
        let session = runtime.block_on(open_session(
            &fetcher,
            ChatPaths::default(),
            MemoryHistory::new(start_path),
            Arc::new(sink.clone()),
        ));
        let app = App::new(session, sink, fetcher, runtime.handle().clone());
        Fixture { root, runtime, app }
    }

    fn bodies(app: &App<LocalFetcher>) -> Vec<String> {
        app.collect_matched_items().iter().map(|m| m.body.clone()).collect()
    }

    #[test]
    fn test_app_starts_on_first_conversation() {
        let f = fixture("/");
        assert_eq!(f.app.session.current(), "Alice");
        assert_eq!(f.app.filtered_count, 3);
        assert_eq!(bodies(&f.app)[0], "hi");
        assert_eq!(f.app.conversation_idx, 0);
    }

    #[test]
    fn test_select_conversation_loads_in_background() {
        let mut f = fixture("/");
        f.app.handle_action(Action::ToggleFocus);
        assert_eq!(f.app.focus, Focus::Conversations);
        f.app.handle_action(Action::MoveDown);
        f.app.handle_action(Action::Enter);

        assert_eq!(f.app.session.current(), "Bob");
        assert_eq!(f.app.load_label().as_deref(), Some("loading"));
        assert_eq!(f.app.filtered_count, 0);

        assert!(f.app.wait_idle(Duration::from_secs(5)));
        assert_eq!(f.app.load_label(), None);
        assert_eq!(f.app.filtered_count, 3);
        assert_eq!(f.app.session.navigation().current_path(), "/chat/Bob");
    }

    #[test]
    fn test_back_and_forward() {
        let mut f = fixture("/chat/Bob");
        assert_eq!(f.app.session.current(), "Bob");
        assert_eq!(f.app.conversation_idx, 1);

        f.app.handle_action(Action::ToggleFocus);
        f.app.handle_action(Action::MoveUp);
        f.app.handle_action(Action::Enter);
        assert!(f.app.wait_idle(Duration::from_secs(5)));
        assert_eq!(f.app.session.current(), "Alice");

        f.app.handle_action(Action::Back);
        assert_eq!(f.app.session.current(), "Bob");
        assert_eq!(f.app.conversation_idx, 1);
        assert!(f.app.wait_idle(Duration::from_secs(5)));

        f.app.handle_action(Action::Forward);
        assert_eq!(f.app.session.current(), "Alice");
        assert!(f.app.wait_idle(Duration::from_secs(5)));
        assert_eq!(bodies(&f.app)[1], "hello");
    }

    #[test]
    fn test_archive_attachment_is_extracted_and_released() {
        let mut f = fixture("/chat/Bob");
        assert!(matches!(f.app.attachment.state(), AttachmentState::Pending { .. }));
        assert!(f.app.wait_idle(Duration::from_secs(5)));

        let lines = f.app.attachment_lines();
        assert_eq!(lines[0], "cat.jpg (image)");
        assert_eq!(lines[1], "image/jpeg, 4 bytes");
        assert_eq!(f.app.session.blob_store().created_count(), 1);
        assert_eq!(f.app.session.blob_store().live_count(), 0);

        f.app.handle_action(Action::MoveDown);
        assert!(matches!(f.app.attachment.state(), AttachmentState::Idle));
    }

    #[test]
    fn test_text_export_attachment_uses_direct_url() {
        let mut f = fixture("/");
        f.app.handle_action(Action::MoveDown);
        f.app.handle_action(Action::MoveDown);

        let lines = f.app.attachment_lines();
        assert_eq!(lines[0], "IMG-0001.jpg (image)");
        assert_eq!(lines[1], "/chats/WhatsApp%20Chat%20with%20Alice/IMG-0001.jpg");
        assert_eq!(f.app.in_flight, 0);
    }

    #[test]
    fn test_filter_and_fuzzy_input() {
        let mut f = fixture("/");
        f.app.handle_action(Action::StartFilter);
        for c in "from:alice | hi".chars() {
            f.app.handle_action(Action::InputChar(c));
        }
        f.app.handle_action(Action::Enter);

        assert!(!f.app.editing);
        assert!(f.app.filter_error.is_none());
        assert_eq!(bodies(&f.app), vec!["hi".to_string()]);

        f.app.handle_action(Action::Escape);
        assert!(f.app.search_query.is_empty());
        assert_eq!(f.app.filtered_count, 3);
    }

    #[test]
    fn test_invalid_filter_reports_error() {
        let mut f = fixture("/");
        f.app.search_query = "has:links |".to_string();
        f.app.apply_filter();
        assert!(f.app.filter_error.as_deref().unwrap().contains("Parse error"));
        assert_eq!(f.app.filtered_count, 3);
    }

    #[test]
    fn test_anonymize_and_active_user() {
        let mut f = fixture("/");
        f.app.handle_action(Action::CycleActiveUser);
        assert_eq!(f.app.active_user.as_deref(), Some("Alice"));
        f.app.handle_action(Action::CycleActiveUser);
        assert_eq!(f.app.active_user.as_deref(), Some("Me"));

        f.app.handle_action(Action::ToggleAnonymize);
        assert!(f.app.session.anonymize());
        assert_eq!(f.app.active_user, None);
        let senders: Vec<_> =
            f.app.collect_matched_items().iter().map(|m| m.sender.clone().unwrap()).collect();
        assert_eq!(senders, ["User 1", "User 2", "User 1"]);

        f.app.handle_action(Action::CycleActiveUser);
        f.app.handle_action(Action::CycleActiveUser);
        f.app.handle_action(Action::CycleActiveUser);
        assert_eq!(f.app.active_user, None);
    }

    #[test]
    fn test_window_limits_messages() {
        let f = fixture("/");
        let app = f.app.with_window(MessageWindow::by_index(Some(2), Some(3)));
        assert_eq!(app.filtered_count, 2);
        assert_eq!(app.collect_matched_items()[0].index, 2);
    }

    fn type_text(app: &mut App<LocalFetcher>, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::InputChar(c));
        }
    }

    #[test]
    fn test_edit_index_window() {
        let mut f = fixture("/");
        f.app.handle_action(Action::EditWindow);
        assert!(f.app.editing);
        type_text(&mut f.app, "2-3");
        assert_eq!(f.app.search_query, "");
        f.app.handle_action(Action::Enter);

        assert!(!f.app.editing);
        assert_eq!(f.app.window, MessageWindow::by_index(Some(2), Some(3)));
        assert_eq!(f.app.filtered_count, 2);
        assert_eq!(bodies(&f.app)[0], "hello");
        assert_eq!(f.app.status_message.as_ref().unwrap().text, "Window: 2-3");

        // Editing starts from the current window; clearing it shows everything again
        f.app.handle_action(Action::EditWindow);
        assert_eq!(f.app.window_input, "2-3");
        for _ in 0..3 {
            f.app.handle_action(Action::DeleteChar);
        }
        f.app.handle_action(Action::Enter);
        assert!(f.app.window.is_unbounded());
        assert_eq!(f.app.filtered_count, 3);
    }

    #[test]
    fn test_date_window_starts_at_date_bounds() {
        let mut f = fixture("/");
        f.app.handle_action(Action::ToggleWindowMode);
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d);
        assert_eq!(f.app.window, MessageWindow::by_date(day(12), day(13)));
        assert_eq!(f.app.filtered_count, 3);

        f.app.handle_action(Action::EditWindow);
        assert_eq!(f.app.window_input, "2024-01-12..2024-01-13");
        for _ in 0.."2024-01-13".len() {
            f.app.handle_action(Action::DeleteChar);
        }
        type_text(&mut f.app, "2024-01-12");
        f.app.handle_action(Action::Enter);
        assert_eq!(f.app.filtered_count, 2);

        f.app.handle_action(Action::ToggleWindowMode);
        assert_eq!(f.app.window, MessageWindow::default());
        assert_eq!(f.app.filtered_count, 3);
    }

    #[test]
    fn test_invalid_window_keeps_current_one() {
        let mut f = fixture("/");
        f.app.handle_action(Action::EditWindow);
        type_text(&mut f.app, "3-1");
        f.app.handle_action(Action::Enter);

        assert!(f.app.filter_error.as_deref().unwrap().contains("Window error"));
        assert!(f.app.window.is_unbounded());
        assert_eq!(f.app.filtered_count, 3);

        f.app.handle_action(Action::EditWindow);
        type_text(&mut f.app, "9");
        f.app.handle_action(Action::Escape);
        assert!(!f.app.editing);
        assert!(!f.app.should_quit);
        assert!(f.app.window.is_unbounded());
    }

    #[test]
    fn test_escape_quits_when_idle() {
        let mut f = fixture("/");
        f.app.handle_action(Action::StartFilter);
        f.app.handle_action(Action::Escape);
        assert!(!f.app.should_quit);
        f.app.handle_action(Action::Escape);
        assert!(f.app.should_quit);
    }

    #[test]
    fn test_copy_without_messages() {
        let root = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let fetcher = LocalFetcher::new(root.path(), "/chats/");
        let sink = RecordingSink::new();
        let session = runtime.block_on(open_session(
            &fetcher,
            ChatPaths::default(),
            MemoryHistory::new("/"),
            Arc::new(sink.clone()),
        ));
        let mut app = App::new(session, sink, fetcher, runtime.handle().clone());

        app.handle_action(Action::CopyToClipboard);
        let status = app.status_message.as_ref().unwrap();
        assert_eq!(status.text, "✗ No message to copy");
        assert_eq!(status.message_type, MessageType::Error);
    }

    #[test]
    fn test_status_message_expiry() {
        let mut f = fixture("/");
        f.app.set_status("Expired", MessageType::Success, 0);
        std::thread::sleep(Duration::from_millis(1));
        f.app.check_and_clear_expired_status();
        assert!(f.app.status_message.is_none());
    }

    #[test]
    fn test_load_failure_surfaces_diagnostic() {
        let mut f = fixture("/chat/Bob");
        let alice = f.root.path().join("WhatsApp Chat with Alice");
        std::fs::remove_file(alice.join("WhatsApp Chat with Alice.txt")).unwrap();

        f.app.handle_action(Action::ToggleFocus);
        f.app.handle_action(Action::MoveUp);
        f.app.handle_action(Action::Enter);
        assert_eq!(f.app.session.current(), "Alice");
        assert!(f.app.wait_idle(Duration::from_secs(5)));

        let status = f.app.status_message.as_ref().unwrap();
        assert_eq!(status.message_type, MessageType::Error);
        assert!(status.text.contains("Error loading chat file"));
        assert_eq!(f.app.load_label().as_deref(), Some("unavailable"));
    }
}
