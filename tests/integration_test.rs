/// End-to-end integration tests for the session pipeline
///
/// These tests serve export folders from a temp directory and verify complete workflows:
/// listing → selection → loading → derivation → attachments
mod common;

use std::sync::Arc;

use chat_export_viewer::session::{
    AttachmentState, DiagnosticKind, FetchError, Fetcher, LoadOutcome, LoadState, LocalFetcher,
    MediaEvent, MemoryHistory, NavigationAdapter, RecordingSink, fetch_export,
    list_conversations, open_session, run_load, select_and_load,
};
use chat_export_viewer::utils::ChatPaths;
use common::{ChatBuilder, ExportDirBuilder, sample_exports};

fn fetcher_for(root: &std::path::Path) -> LocalFetcher {
    LocalFetcher::new(root, "/chats/")
}

#[tokio::test]
async fn test_e2e_directory_lists_marked_folders_only() {
    let exports = sample_exports().build();
    let sink = RecordingSink::new();

    let directory =
        list_conversations(&fetcher_for(exports.path()), &ChatPaths::default(), &sink).await;

    assert_eq!(directory.as_slice(), ["Alice".to_string(), "Bob".to_string()]);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_e2e_unreachable_directory_is_empty_and_reported() {
    let exports = ExportDirBuilder::new().build();
    let missing = exports.path().join("nowhere");
    let sink = RecordingSink::new();

    let session = open_session(
        &fetcher_for(&missing),
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(sink.clone()),
    )
    .await;

    assert_eq!(session.directory().map(|d| d.len()), Some(0));
    assert_eq!(session.current(), "");
    assert_eq!(session.load_state(), &LoadState::Idle);
    assert_eq!(sink.count(DiagnosticKind::DirectoryUnavailable), 1);
    assert_eq!(session.navigation().current_path(), "/");
}

#[tokio::test]
async fn test_e2e_root_path_opens_first_conversation() {
    let exports = sample_exports().build();
    let sink = RecordingSink::new();

    let session = open_session(
        &fetcher_for(exports.path()),
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(sink.clone()),
    )
    .await;

    assert_eq!(session.current(), "Alice");
    assert_eq!(session.navigation().current_path(), "/chat/Alice");
    assert_eq!(session.navigation().push_count(), 0);

    let derived = session.derivations();
    assert!(derived.archive.is_none());
    assert_eq!(derived.messages.len(), 4);
    assert!(derived.messages[0].is_system());
    let names: Vec<_> = derived.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Me"]);
    assert_eq!(derived.participants[0].message_count, 2);

    let bounds = derived.date_bounds.expect("bounds for a non-empty chat");
    assert_eq!(bounds.earliest.format("%d/%m %H:%M").to_string(), "12/01 09:59");
    assert_eq!(bounds.latest.format("%d/%m %H:%M").to_string(), "13/01 09:00");
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_e2e_unknown_deep_link_falls_back_to_first() {
    let exports = sample_exports().build();

    let session = open_session(
        &fetcher_for(exports.path()),
        ChatPaths::default(),
        MemoryHistory::new("/chat/Zed"),
        Arc::new(RecordingSink::new()),
    )
    .await;

    assert_eq!(session.current(), "Alice");
    assert_eq!(session.navigation().current_path(), "/chat/Alice");
    assert_eq!(session.navigation().history_state().as_deref(), Some("Alice"));
    assert_eq!(session.navigation().len(), 1);
}

#[tokio::test]
async fn test_e2e_zip_export_and_attachment_extraction() {
    let exports = sample_exports().build();
    let fetcher = fetcher_for(exports.path());
    let sink = RecordingSink::new();

    let session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/chat/Bob"),
        Arc::new(sink.clone()),
    )
    .await;

    assert_eq!(session.current(), "Bob");
    let payload = session.payload().expect("zip export committed");
    assert!(payload.source_path().ends_with(".zip"));

    let derived = session.derivations();
    assert_eq!(derived.messages.len(), 3);
    assert_eq!(derived.messages[0].attachment.as_deref(), Some("cat.jpg"));

    let mut view = session.attachment_view();
    let request = session
        .resolve_attachment(&mut view, "cat.jpg", None)
        .expect("archived attachment needs extraction");
    assert!(matches!(view.state(), AttachmentState::Pending { .. }));

    assert!(view.complete(request.run_blocking().await));
    let blob = view.blob().expect("object URL is live");
    assert_eq!(blob.mime, "image/jpeg");
    assert_eq!(&blob.bytes[..], b"\xff\xd8\xff\xe0cat");
    assert_eq!(session.blob_store().live_count(), 1);

    assert!(view.on_media_event(MediaEvent::Loaded));
    assert!(!view.on_media_event(MediaEvent::Loaded));
    assert_eq!(session.blob_store().live_count(), 0);
    assert_eq!(session.blob_store().revoked_count(), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_e2e_missing_archive_entry_is_reported() {
    let exports = sample_exports().build();
    let sink = RecordingSink::new();
    let session = open_session(
        &fetcher_for(exports.path()),
        ChatPaths::default(),
        MemoryHistory::new("/chat/Bob"),
        Arc::new(sink.clone()),
    )
    .await;

    let mut view = session.attachment_view();
    assert!(session.resolve_attachment(&mut view, "missing.png", None).is_none());

    assert!(matches!(view.state(), AttachmentState::Unavailable { .. }));
    let diagnostic = sink.last().expect("missing entry reported");
    assert_eq!(diagnostic.kind, DiagnosticKind::AttachmentMissing);
    assert_eq!(diagnostic.message, "File not found in archive: missing.png");
    assert_eq!(session.blob_store().created_count(), 0);
}

#[tokio::test]
async fn test_e2e_text_export_attachment_served_directly() {
    let exports = sample_exports().build();
    let fetcher = fetcher_for(exports.path());
    let session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(RecordingSink::new()),
    )
    .await;

    let url = session.paths().attachment_url(session.current(), "IMG-0001.jpg");
    assert_eq!(url, format!("{}IMG-0001.jpg", session.media_base_url()));

    let mut view = session.attachment_view();
    assert!(session.resolve_attachment(&mut view, "IMG-0001.jpg", Some(&url)).is_none());
    let AttachmentState::Ready { source, .. } = view.state() else {
        panic!("direct attachment should be ready");
    };
    let bytes = fetcher.fetch(source.url()).await.unwrap();
    assert_eq!(&bytes[..], b"\xff\xd8\xff\xe0alice");
    assert_eq!(session.blob_store().created_count(), 0);
}

#[tokio::test]
async fn test_e2e_stale_load_is_discarded() {
    let exports = sample_exports().build();
    let fetcher = fetcher_for(exports.path());
    let mut session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(RecordingSink::new()),
    )
    .await;

    let to_bob = session.select("Bob").expect("Bob needs loading");
    assert!(session.payload().is_none());
    let to_alice = session.select("Alice").expect("Alice needs loading");

    let bob_result = fetch_export(&fetcher, &to_bob).await;
    assert_eq!(session.complete_load(to_bob, bob_result), LoadOutcome::Discarded);
    assert!(session.payload().is_none());
    assert!(session.derivations().messages.is_empty());

    assert_eq!(run_load(&mut session, &fetcher, to_alice).await, LoadOutcome::Committed);
    assert_eq!(session.payload().map(|p| p.identifier().to_string()).as_deref(), Some("Alice"));
    assert_eq!(session.derivations().messages.len(), 4);
}

#[tokio::test]
async fn test_e2e_earlier_visit_cannot_clobber_revisit() {
    let exports = sample_exports().build();
    let fetcher = fetcher_for(exports.path());
    let sink = RecordingSink::new();
    let mut session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(sink.clone()),
    )
    .await;

    let _first_bob = session.select("Bob").expect("Bob needs loading");
    let earlier_alice = session.select("Alice").expect("Alice needs loading");
    let _second_bob = session.select("Bob").expect("Bob needs loading");
    let latest_alice = session.select("Alice").expect("Alice needs loading");

    assert_eq!(run_load(&mut session, &fetcher, latest_alice).await, LoadOutcome::Committed);

    let late_failure = Err(FetchError::not_found("/chats/gone.txt"));
    assert_eq!(session.complete_load(earlier_alice, late_failure), LoadOutcome::Discarded);

    assert_eq!(session.load_state(), &LoadState::Ready { identifier: "Alice".to_string() });
    assert_eq!(session.derivations().messages.len(), 4);
    assert_eq!(sink.count(DiagnosticKind::ExportUnavailable), 0);
}

#[tokio::test]
async fn test_e2e_missing_export_fails_with_diagnostic() {
    let exports = sample_exports().with_media("Carol", "note.txt", b"not an export").build();
    let sink = RecordingSink::new();
    let fetcher = fetcher_for(exports.path());
    let mut session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(sink.clone()),
    )
    .await;

    let outcome = select_and_load(&mut session, &fetcher, "Carol").await;
    assert_eq!(outcome, Some(LoadOutcome::Failed));
    assert!(session.payload().is_none());
    assert!(matches!(session.load_state(), LoadState::Failed { identifier, .. } if identifier == "Carol"));

    let diagnostic = sink.last().expect("failure reported");
    assert_eq!(diagnostic.kind, DiagnosticKind::ExportUnavailable);
    assert_eq!(diagnostic.message, "Error loading chat file for Carol");
    assert!(diagnostic.cause.is_some());
}

#[tokio::test]
async fn test_e2e_history_back_and_forward() {
    let exports = sample_exports().build();
    let fetcher = fetcher_for(exports.path());
    let mut session = open_session(
        &fetcher,
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(RecordingSink::new()),
    )
    .await;

    assert_eq!(select_and_load(&mut session, &fetcher, "Bob").await, Some(LoadOutcome::Committed));
    assert_eq!(session.navigation().current_path(), "/chat/Bob");
    assert_eq!(session.navigation().push_count(), 1);

    // Re-selecting the current conversation neither loads nor pushes
    assert_eq!(select_and_load(&mut session, &fetcher, "Bob").await, None);
    assert_eq!(session.navigation().push_count(), 1);

    let ticket = session.back().expect("back to Alice loads");
    assert_eq!(session.current(), "Alice");
    run_load(&mut session, &fetcher, ticket).await;
    assert_eq!(session.navigation().current_path(), "/chat/Alice");

    let ticket = session.forward().expect("forward to Bob loads");
    assert_eq!(session.current(), "Bob");
    run_load(&mut session, &fetcher, ticket).await;
    assert!(session.derivations().archive.is_some());

    assert!(session.forward().is_none());
    assert_eq!(session.navigation().push_count(), 1);
}

#[tokio::test]
async fn test_e2e_anonymize_keeps_order_and_counts() {
    let exports = sample_exports().build();
    let mut session = open_session(
        &fetcher_for(exports.path()),
        ChatPaths::default(),
        MemoryHistory::new("/"),
        Arc::new(RecordingSink::new()),
    )
    .await;
    let plain = session.derivations();

    session.set_anonymize(true);
    let anonymized = session.derivations();

    assert_eq!(anonymized.messages.len(), plain.messages.len());
    assert_eq!(anonymized.revision, plain.revision);
    let bodies = |d: &chat_export_viewer::session::Derivations| {
        d.messages.iter().map(|m| m.body.clone()).collect::<Vec<_>>()
    };
    assert_eq!(bodies(&*anonymized), bodies(&*plain));
    let names: Vec<_> = anonymized.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["User 1", "User 2"]);
}

#[tokio::test]
async fn test_e2e_custom_folder_prefix() {
    let chat = ChatBuilder::new().message("01/02/2024, 12:00", "Dana", "hey").build();
    let exports = ExportDirBuilder::new().with_text_export("Dana", &chat).build();
    let root = exports.path();
    std::fs::rename(root.join("WhatsApp Chat with Dana"), root.join("Chat - Dana")).unwrap();
    std::fs::rename(
        root.join("Chat - Dana").join("WhatsApp Chat with Dana.txt"),
        root.join("Chat - Dana").join("Chat - Dana.txt"),
    )
    .unwrap();

    let config = chat_export_viewer::models::ViewerConfig::default().with_folder_prefix("Chat - ");
    let session = open_session(
        &fetcher_for(root),
        ChatPaths::new(config),
        MemoryHistory::new("/"),
        Arc::new(RecordingSink::new()),
    )
    .await;

    assert_eq!(session.current(), "Dana");
    assert_eq!(session.derivations().messages[0].body, "hey");
}
