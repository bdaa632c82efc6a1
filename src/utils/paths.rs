use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::models::ViewerConfig;

// Same unreserved set as a browser's encodeURIComponent
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single path component (slashes included)
///
/// # Examples
///
/// ```
/// use chat_export_viewer::utils::encode_component;
///
/// assert_eq!(encode_component("Alice & Bob/Team"), "Alice%20%26%20Bob%2FTeam");
/// ```
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT_SET).to_string()
}

/// Percent-decodes a path component; invalid UTF-8 sequences are replaced
pub fn decode_component(encoded: &str) -> String {
    match percent_decode_str(encoded).decode_utf8_lossy() {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

/// Maps conversation identifiers to folder names, client routes and server paths.
///
/// All operations are pure. The empty identifier means "no conversation" and maps to
/// the root route `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPaths {
    config: ViewerConfig,
}

impl ChatPaths {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Storage folder name: the folder marker followed by the identifier
    pub fn storage_folder(&self, id: &str) -> String {
        format!("{}{}", self.config.folder_prefix, id)
    }

    /// Navigable route for an identifier
    ///
    /// ```
    /// use chat_export_viewer::utils::ChatPaths;
    ///
    /// let paths = ChatPaths::default();
    /// assert_eq!(paths.client_path("Alice"), "/chat/Alice");
    /// assert_eq!(paths.client_path(""), "/");
    /// ```
    pub fn client_path(&self, id: &str) -> String {
        if id.is_empty() {
            return "/".to_string();
        }
        format!("{}{}", self.config.client_prefix, encode_component(id))
    }

    /// Identifier encoded by a client route, or `""` when the route names none
    pub fn identifier_from_client_path(&self, path: &str) -> String {
        path.strip_prefix(self.config.client_prefix.as_str())
            .map(decode_component)
            .unwrap_or_default()
    }

    /// Server path of the directory listing
    pub fn listing_path(&self) -> &str {
        &self.config.data_prefix
    }

    /// Base URL for direct attachment fetches, `""` for the empty identifier
    pub fn media_base_url(&self, id: &str) -> String {
        if id.is_empty() {
            return String::new();
        }
        format!("{}{}/", self.config.data_prefix, encode_component(&self.storage_folder(id)))
    }

    /// Server path of the primary export file (`<folder>/<folder>.txt`)
    pub fn fetch_path(&self, id: &str) -> String {
        self.export_file_path(id, "txt")
    }

    /// Candidate export paths in fetch order: the text export, then a zipped export
    pub fn export_paths(&self, id: &str) -> Vec<String> {
        vec![self.export_file_path(id, "txt"), self.export_file_path(id, "zip")]
    }

    /// Direct URL of an attachment stored next to the export
    pub fn attachment_url(&self, id: &str, file_name: &str) -> String {
        format!("{}{}", self.media_base_url(id), encode_component(file_name))
    }

    /// Bare identifier for a listed folder name, if it carries the folder marker
    pub fn identifier_from_folder(&self, folder: &str) -> Option<String> {
        folder.strip_prefix(self.config.folder_prefix.as_str()).map(str::to_string)
    }

    fn export_file_path(&self, id: &str, extension: &str) -> String {
        let folder = self.storage_folder(id);
        format!("{}{}.{}", self.media_base_url(id), encode_component(&folder), extension)
    }
}

/// Validates that a decoded relative path stays inside its root
///
/// # Errors
///
/// Returns an error if the path is absolute or contains `..` components.
pub fn validate_relative_path(path: &Path) -> Result<()> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => bail!("Path contains '..' component: {}", path.display()),
            Component::RootDir | Component::Prefix(_) => {
                bail!("Path must be relative: {}", path.display())
            }
        }
    }
    Ok(())
}

/// Decodes every `/`-separated segment of a server path into a relative file system path
///
/// # Errors
///
/// Returns an error if a decoded segment contains a separator or the result escapes
/// the root (see [`validate_relative_path`]).
pub fn decode_server_path(encoded: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for segment in encoded.split('/').filter(|s| !s.is_empty()) {
        let decoded = decode_component(segment);
        if decoded.contains('/') || decoded.contains('\\') {
            bail!("Encoded separator in path segment: {}", segment);
        }
        path.push(decoded);
    }
    validate_relative_path(&path)?;
    Ok(path)
}
