//! Read-only access to the export server.
//!
//! [`HttpFetcher`] talks to a static host (nginx with `autoindex on`).
//! [`LocalFetcher`] serves a directory from disk and renders folder listings in the
//! same autoindex shape, so the rest of the pipeline can't tell the difference.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::utils::{decode_server_path, encode_component};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status} for {path}")]
    Status { status: u16, path: String },
    #[error("Request for {path} failed: {message}")]
    Transport { path: String, message: String },
    #[error("Invalid path {path}: {message}")]
    InvalidPath { path: String, message: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn not_found(path: &str) -> Self {
        FetchError::Status { status: 404, path: path.to_string() }
    }
}

/// GET capability over server paths (`/chats/...`)
pub trait Fetcher: Send + Sync {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// HTTP fetcher rooted at a server base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    base_url: String,
}

impl HttpFetcher {
    /// Fails when the TLS backend or system configuration cannot be initialised
    pub fn new(base_url: &str) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let transport = |e: reqwest::Error| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        };
        let response = self.http.get(&url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), path: path.to_string() });
        }
        response.bytes().await.map_err(transport)
    }
}

/// Serves a local directory mounted at a server path prefix.
///
/// `/chats/` with root `./exports` maps `/chats/A/A.txt` to `./exports/A/A.txt`.
/// Directory requests return an autoindex page.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    root: PathBuf,
    mount: String,
}

impl LocalFetcher {
    pub fn new(root: impl Into<PathBuf>, mount: &str) -> Self {
        Self { root: root.into(), mount: mount.to_string() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let Some(relative) = path.strip_prefix(self.mount.as_str()) else {
            return Err(FetchError::not_found(path));
        };
        let relative = decode_server_path(relative).map_err(|e| FetchError::InvalidPath {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(self.root.join(relative))
    }
}

impl Fetcher for LocalFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        let target = self.resolve(path)?;
        debug!(path, target = %target.display(), "Local fetch");

        let metadata = match tokio::fs::metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::not_found(path));
            }
            Err(source) => return Err(FetchError::Io { path: path.to_string(), source }),
        };

        if metadata.is_dir() {
            let listing = render_listing(&target, path)
                .await
                .map_err(|source| FetchError::Io { path: path.to_string(), source })?;
            return Ok(Bytes::from(listing));
        }

        tokio::fs::read(&target)
            .await
            .map(Bytes::from)
            .map_err(|source| FetchError::Io { path: path.to_string(), source })
    }
}

/// Either fetcher, picked at startup from `--root` / `--server`
#[derive(Debug, Clone)]
pub enum ServerFetcher {
    Http(HttpFetcher),
    Local(LocalFetcher),
}

impl ServerFetcher {
    pub fn describe(&self) -> String {
        match self {
            ServerFetcher::Http(fetcher) => fetcher.base_url().to_string(),
            ServerFetcher::Local(fetcher) => fetcher.root().display().to_string(),
        }
    }
}

impl Fetcher for ServerFetcher {
    async fn fetch(&self, path: &str) -> Result<Bytes, FetchError> {
        match self {
            ServerFetcher::Http(fetcher) => fetcher.fetch(path).await,
            ServerFetcher::Local(fetcher) => fetcher.fetch(path).await,
        }
    }
}

/// Render a directory the way nginx autoindex does: sorted, folders with a trailing slash
async fn render_listing(dir: &Path, request_path: &str) -> std::io::Result<String> {
    let mut entries = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().await?.is_dir();
        entries.push((name, is_dir));
    }
    entries.sort();

    let mut html = format!(
        "<html>\n<head><title>Index of {request_path}</title></head>\n<body>\n<h1>Index of {request_path}</h1><hr><pre><a href=\"../\">../</a>\n"
    );
    for (name, is_dir) in entries {
        let slash = if is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<a href=\"{}{slash}\">{}{slash}</a>\n",
            encode_component(&name),
            escape_html(&name)
        ));
    }
    html.push_str("</pre><hr></body>\n</html>\n");
    Ok(html)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
