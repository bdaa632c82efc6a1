//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Folder marker used by the default configuration
pub const PREFIX: &str = "WhatsApp Chat with ";

/// Builder for a served export directory (`<root>/<marker><id>/<marker><id>.txt|.zip`)
pub struct ExportDirBuilder {
    temp_dir: TempDir,
}

impl ExportDirBuilder {
    /// Create a new builder with an empty export root
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    /// Get the path to the export root
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a conversation exported as plain text
    pub fn with_text_export(self, id: &str, content: &str) -> Self {
        let folder = self.folder(id);
        let file = folder.join(format!("{PREFIX}{id}.txt"));
        fs::write(file, content).expect("Failed to write text export");
        self
    }

    /// Add a conversation exported as a zip with the chat at `_chat.txt`
    pub fn with_zip_export(self, id: &str, content: &str, media: &[(&str, &[u8])]) -> Self {
        let mut entries: Vec<(&str, &[u8])> = vec![("_chat.txt", content.as_bytes())];
        entries.extend_from_slice(media);
        self.with_zip_entries(id, &entries)
    }

    /// Add a conversation exported as a zip with arbitrary entries
    pub fn with_zip_entries(self, id: &str, entries: &[(&str, &[u8])]) -> Self {
        let folder = self.folder(id);
        let file = folder.join(format!("{PREFIX}{id}.zip"));
        fs::write(file, zip_bytes(entries)).expect("Failed to write zip export");
        self
    }

    /// Add a media file next to a conversation's text export
    pub fn with_media(self, id: &str, name: &str, bytes: &[u8]) -> Self {
        let folder = self.folder(id);
        fs::write(folder.join(name), bytes).expect("Failed to write media file");
        self
    }

    /// Add a folder that is not a conversation (no marker)
    pub fn with_unrelated_folder(self, name: &str) -> Self {
        fs::create_dir_all(self.temp_dir.path().join(name)).expect("Failed to create folder");
        self
    }

    /// Build and return the temp directory (consumes self)
    pub fn build(self) -> TempDir {
        self.temp_dir
    }

    fn folder(&self, id: &str) -> std::path::PathBuf {
        let folder = self.temp_dir.path().join(format!("{PREFIX}{id}"));
        fs::create_dir_all(&folder).expect("Failed to create conversation folder");
        folder
    }
}

impl Default for ExportDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Zip archive bytes holding `entries` in order
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).expect("Failed to start zip entry");
        writer.write_all(data).expect("Failed to write zip entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Builder for Android-style export text (`DD/MM/YYYY, HH:MM - Sender: body`)
pub struct ChatBuilder {
    lines: Vec<String>,
}

impl ChatBuilder {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// A message from `sender`; `at` is `DD/MM/YYYY, HH:MM`
    pub fn message(mut self, at: &str, sender: &str, body: &str) -> Self {
        self.lines.push(format!("{at} - {sender}: {body}"));
        self
    }

    /// A message carrying an attachment
    pub fn attachment(self, at: &str, sender: &str, file_name: &str) -> Self {
        self.message(at, sender, &format!("{file_name} (file attached)"))
    }

    /// A system line without a sender
    pub fn system(mut self, at: &str, text: &str) -> Self {
        self.lines.push(format!("{at} - {text}"));
        self
    }

    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}

impl Default for ChatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Two conversations: Alice (plain text with a loose photo) and Bob (zip with media)
pub fn sample_exports() -> ExportDirBuilder {
    let alice = ChatBuilder::new()
        .system("12/01/2024, 09:59", "Messages are end-to-end encrypted.")
        .message("12/01/2024, 10:00", "Alice", "hi")
        .message("12/01/2024, 10:01", "Me", "hello")
        .attachment("13/01/2024, 09:00", "Alice", "IMG-0001.jpg")
        .build();
    let bob = ChatBuilder::new()
        .attachment("14/01/2024, 08:00", "Bob", "cat.jpg")
        .message("14/01/2024, 08:05", "Me", "cute")
        .attachment("15/01/2024, 21:00", "Bob", "voice.opus")
        .build();

    ExportDirBuilder::new()
        .with_text_export("Alice", &alice)
        .with_media("Alice", "IMG-0001.jpg", b"\xff\xd8\xff\xe0alice")
        .with_zip_export("Bob", &bob, &[("cat.jpg", b"\xff\xd8\xff\xe0cat"), ("voice.opus", b"OggS")])
        .with_unrelated_folder("backups")
}
