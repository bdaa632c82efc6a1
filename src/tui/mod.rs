//! Interactive terminal viewer over a [`ChatSession`](crate::session::ChatSession).
mod app;
mod events;
mod layout;
mod rendering;
mod terminal;
mod timestamps;

use std::sync::Arc;

use anyhow::Result;
pub use app::App;
use terminal::TerminalManager;
use tokio::runtime::Runtime;
use tracing::info;

use crate::filters::MessageWindow;
use crate::session::{Fetcher, MemoryHistory, RecordingSink, open_session};
use crate::utils::ChatPaths;

/// Everything the viewer needs besides the server connection
#[derive(Debug, Clone, Default)]
pub struct ViewerOptions {
    /// Conversation to open; `None` opens the first one
    pub initial: Option<String>,
    pub anonymize: bool,
    pub window: MessageWindow,
}

/// Run the interactive viewer until the user quits
pub fn run_interactive<F: Fetcher + Clone + 'static>(
    runtime: &Runtime,
    fetcher: F,
    paths: ChatPaths,
    options: ViewerOptions,
) -> Result<()> {
    let start = paths.client_path(options.initial.as_deref().unwrap_or_default());
    let sink = RecordingSink::new();
    let mut session = runtime.block_on(open_session(
        &fetcher,
        paths,
        MemoryHistory::new(&start),
        Arc::new(sink.clone()),
    ));
    session.set_anonymize(options.anonymize);
    info!(
        conversations = session.directory().map_or(0, |d| d.len()),
        current = session.current(),
        "Starting viewer"
    );

    let mut app =
        App::new(session, sink, fetcher, runtime.handle().clone()).with_window(options.window);

    let mut manager = TerminalManager::new()?;
    let res = app.run(manager.terminal_mut());
    manager.restore()?;
    res
}
