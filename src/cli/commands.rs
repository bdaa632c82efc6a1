use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::clipboard::message_clipboard_text;
use crate::filters::{MessageWindow, apply_filters, parse_filter};
use crate::models::{Message, ViewerConfig};
use crate::session::{
    AttachmentState, ChatSession, DiagnosticSink, FALLBACK_TEXT, Fetcher, HttpFetcher,
    LoadState, LocalFetcher, MediaEvent, MemoryHistory, ServerFetcher, TracingSink,
    list_conversations, open_session,
};
use crate::tui::{ViewerOptions, run_interactive};
use crate::utils::{ChatPaths, server_url_from_env};

#[derive(Parser)]
#[command(name = "chat-export-viewer")]
#[command(version)]
#[command(about = "Browse exported chat conversations served as static folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Log filter used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

/// Where exports come from
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Base URL of the export server [default: $CHAT_VIEWER_SERVER or http://localhost:8080]
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Serve exports from a local directory instead of a server
    #[arg(long, global = true, conflicts_with = "server")]
    pub root: Option<PathBuf>,

    /// Folder name marker in front of every conversation identifier
    #[arg(long, global = true)]
    pub folder_prefix: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available conversations
    List,
    /// Print the messages of a conversation
    Show {
        id: String,
        /// Replace sender names with stable pseudonyms
        #[arg(long)]
        anonymize: bool,
        /// Filter expression, e.g. `from:alice has:media`
        #[arg(long)]
        filter: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        /// Print messages as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show participants and the date range of a conversation
    Stats { id: String },
    /// Write an attachment of a conversation to disk
    Extract {
        id: String,
        file: String,
        /// Output path [default: the attachment's file name]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Open the interactive viewer (default)
    Tui {
        id: Option<String>,
        #[arg(long)]
        anonymize: bool,
        #[command(flatten)]
        window: WindowArgs,
    },
}

/// Index or date window over the message list
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// First message number (1-based)
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub from: Option<usize>,
    /// Last message number
    #[arg(long, conflicts_with_all = ["since", "until"])]
    pub to: Option<usize>,
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

impl WindowArgs {
    pub fn window(&self) -> MessageWindow {
        if self.since.is_some() || self.until.is_some() {
            MessageWindow::by_date(self.since, self.until)
        } else {
            MessageWindow::by_index(self.from, self.to)
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let fetcher = build_fetcher(&cli.server)?;
    let paths = build_paths(&cli.server);
    debug!(source = %fetcher.describe(), "Export source");

    match cli.command {
        Some(Commands::List) => list(&runtime, &fetcher, &paths),
        Some(Commands::Show { id, anonymize, filter, window, json }) => {
            show(&runtime, &fetcher, paths, &id, anonymize, filter.as_deref(), window.window(), json)
        }
        Some(Commands::Stats { id }) => stats(&runtime, &fetcher, paths, &id),
        Some(Commands::Extract { id, file, output }) => {
            extract(&runtime, &fetcher, paths, &id, &file, output)
        }
        Some(Commands::Tui { id, anonymize, window }) => run_interactive(
            &runtime,
            fetcher,
            paths,
            ViewerOptions { initial: id, anonymize, window: window.window() },
        ),
        None => run_interactive(&runtime, fetcher, paths, ViewerOptions::default()),
    }
}

/// `RUST_LOG` wins over `--log-level`. Logs always go to stderr.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn build_fetcher(args: &ServerArgs) -> Result<ServerFetcher> {
    match &args.root {
        Some(root) => Ok(ServerFetcher::Local(LocalFetcher::new(
            root,
            ViewerConfig::default().data_prefix.as_str(),
        ))),
        None => {
            let url = args.server.clone().unwrap_or_else(server_url_from_env);
            let fetcher = HttpFetcher::new(&url).context("Failed to build HTTP client")?;
            Ok(ServerFetcher::Http(fetcher))
        }
    }
}

fn build_paths(args: &ServerArgs) -> ChatPaths {
    let config = match &args.folder_prefix {
        Some(prefix) => ViewerConfig::default().with_folder_prefix(prefix.as_str()),
        None => ViewerConfig::default(),
    };
    ChatPaths::new(config)
}

fn list(runtime: &Runtime, fetcher: &ServerFetcher, paths: &ChatPaths) -> Result<()> {
    let directory = runtime.block_on(list_conversations(fetcher, paths, &TracingSink));
    if directory.is_empty() {
        println!("No conversations available");
        return Ok(());
    }
    let mut out = io::stdout().lock();
    for id in directory.as_slice() {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

/// Deep-link into `id` the way a pasted `/chat/<id>` route would and wait for its export
fn open_conversation<F: Fetcher>(
    runtime: &Runtime,
    fetcher: &F,
    paths: ChatPaths,
    id: &str,
    anonymize: bool,
) -> Result<ChatSession<MemoryHistory>> {
    let start = paths.client_path(id);
    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let mut session =
        runtime.block_on(open_session(fetcher, paths, MemoryHistory::new(&start), sink));

    if session.current() != id {
        bail!("Conversation not found: {id}");
    }
    if let LoadState::Failed { error, .. } = session.load_state() {
        bail!("Error loading chat file for {id}: {error}");
    }
    session.set_anonymize(anonymize);
    Ok(session)
}

#[allow(clippy::too_many_arguments)]
fn show(
    runtime: &Runtime,
    fetcher: &ServerFetcher,
    paths: ChatPaths,
    id: &str,
    anonymize: bool,
    filter: Option<&str>,
    window: MessageWindow,
    json: bool,
) -> Result<()> {
    let session = open_conversation(runtime, fetcher, paths, id, anonymize)?;
    let derived = session.derivations();

    let mut messages: Vec<Message> = window.apply(&derived.messages).into_iter().cloned().collect();
    if let Some(filter) = filter {
        let expr = parse_filter(filter).context("Invalid filter expression")?;
        messages = apply_filters(messages, &expr)?;
    }

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &messages).context("Failed to write JSON")?;
        writeln!(out)?;
        return Ok(());
    }
    for message in &messages {
        writeln!(out, "{}", message_clipboard_text(message, true))?;
    }
    Ok(())
}

fn stats(runtime: &Runtime, fetcher: &ServerFetcher, paths: ChatPaths, id: &str) -> Result<()> {
    let session = open_conversation(runtime, fetcher, paths, id, false)?;
    let derived = session.derivations();

    println!("Conversation: {id}");
    println!("==============={}", "=".repeat(id.chars().count()));
    println!("Messages: {}", derived.messages.len());
    if let Some(bounds) = derived.date_bounds {
        println!("First message: {}", bounds.earliest.format("%Y-%m-%d %H:%M"));
        println!("Last message: {}", bounds.latest.format("%Y-%m-%d %H:%M"));
    }
    if derived.archive.is_some() {
        println!("Source: zip archive");
    }
    println!();
    println!("Participants: {}", derived.participants.len());
    let width = derived.participants.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    for participant in &derived.participants {
        println!("  {:<width$}  {}", participant.name, participant.message_count);
    }
    Ok(())
}

fn extract(
    runtime: &Runtime,
    fetcher: &ServerFetcher,
    paths: ChatPaths,
    id: &str,
    file: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = open_conversation(runtime, fetcher, paths, id, false)?;
    let derived = session.derivations();
    let mut view = session.attachment_view();

    let direct_url = derived.archive.is_none().then(|| session.paths().attachment_url(id, file));
    if let Some(request) = session.resolve_attachment(&mut view, file, direct_url.as_deref()) {
        let outcome = runtime.block_on(request.run_blocking());
        view.complete(outcome);
    }

    let bytes = match view.state() {
        AttachmentState::Ready { source, .. } => match view.blob() {
            Some(blob) => blob.bytes,
            None => runtime
                .block_on(fetcher.fetch(source.url()))
                .with_context(|| format!("{FALLBACK_TEXT}: {file}"))?,
        },
        AttachmentState::Unavailable { reason, file_name } => bail!("{reason}: {file_name}"),
        AttachmentState::Idle | AttachmentState::Pending { .. } => {
            bail!("{FALLBACK_TEXT}: {file}")
        }
    };
    view.on_media_event(MediaEvent::Downloaded);

    let output = output.unwrap_or_else(|| PathBuf::from(file));
    std::fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
