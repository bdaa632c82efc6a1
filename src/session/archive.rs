use std::io::{Cursor, Read};

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use super::loader::RawExport;

/// Entry name WhatsApp uses for the chat text inside iOS exports
const IOS_CHAT_ENTRY: &str = "_chat.txt";
/// Upper bound on the buffer reserved up front from an entry's declared size
const MAX_SIZE_HINT: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),
    #[error("Failed to read archive entry {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: ZipError,
    },
    #[error("Failed to decompress archive entry {name}: {source}")]
    Decompress {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable, queryable view over a zipped export.
///
/// Cloning is cheap (the underlying bytes are shared), and every read works on its own
/// clone of the central directory so handles can be read from several tasks at once.
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    archive: ZipArchive<Cursor<Bytes>>,
}

impl ArchiveHandle {
    pub fn open(bytes: Bytes) -> Result<Self, ZipError> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Names of every entry in the archive
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    pub fn read_entry(&self, name: &str) -> Result<Bytes, ArchiveError> {
        let mut archive = self.archive.clone();
        let mut entry = archive.by_name(name).map_err(|source| match source {
            ZipError::FileNotFound => ArchiveError::EntryNotFound(name.to_string()),
            source => ArchiveError::Read { name: name.to_string(), source },
        })?;

        let mut buffer = Vec::with_capacity(size_hint(entry.size()));
        entry
            .read_to_end(&mut buffer)
            .map_err(|source| ArchiveError::Decompress { name: name.to_string(), source })?;
        Ok(Bytes::from(buffer))
    }

    /// Name of the chat text entry: `_chat.txt`, else `preferred` (e.g. `<folder>.txt`),
    /// else the first top-level `.txt` entry.
    pub fn chat_entry_name(&self, preferred: Option<&str>) -> Option<String> {
        if self.contains(IOS_CHAT_ENTRY) {
            return Some(IOS_CHAT_ENTRY.to_string());
        }
        if let Some(preferred) = preferred
            && self.contains(preferred)
        {
            return Some(preferred.to_string());
        }
        self.archive
            .file_names()
            .filter(|name| !name.contains('/') && name.to_lowercase().ends_with(".txt"))
            .min_by_key(|name| self.archive.index_for_name(name))
            .map(str::to_string)
    }
}

/// The size in the header is whatever the archive claims, so it only seeds the buffer
fn size_hint(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_SIZE_HINT, |size| size.min(MAX_SIZE_HINT))
}

/// Open `payload` as an archive. Absent payloads and anything that isn't a readable
/// zip resolve to `None` and are treated as plain text downstream.
pub fn resolve(payload: Option<&RawExport>) -> Option<ArchiveHandle> {
    let payload = payload?;
    if !payload.looks_like_zip() {
        return None;
    }
    match ArchiveHandle::open(payload.bytes().clone()) {
        Ok(handle) => {
            debug!(
                identifier = payload.identifier(),
                entries = handle.len(),
                "Resolved export archive"
            );
            Some(handle)
        }
        Err(e) => {
            debug!(identifier = payload.identifier(), error = %e, "Payload is not a readable archive");
            None
        }
    }
}
