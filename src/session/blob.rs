//! Temporary in-memory URLs (`blob:<uuid>`) backed by extracted bytes.
//!
//! Each [`ObjectUrl`] owns one registration in its [`BlobStore`] and revokes it exactly
//! once: on an explicit [`ObjectUrl::release`], or when dropped.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

const SCHEME: &str = "blob:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub mime: String,
}

#[derive(Debug, Default)]
struct StoreInner {
    live: HashMap<String, Blob>,
    created: usize,
    revoked: usize,
}

/// Process-local registry of live object URLs
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_object_url(&self, bytes: Bytes, mime: impl Into<String>) -> ObjectUrl {
        let url = format!("{SCHEME}{}", Uuid::new_v4());
        let blob = Blob { bytes, mime: mime.into() };
        trace!(%url, size = blob.bytes.len(), mime = %blob.mime, "Created object URL");

        let mut inner = self.inner.lock();
        inner.live.insert(url.clone(), blob);
        inner.created += 1;
        drop(inner);

        ObjectUrl { url, store: self.clone(), released: false }
    }

    /// Bytes behind a live URL; `None` once revoked
    pub fn get(&self, url: &str) -> Option<Blob> {
        self.inner.lock().live.get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    pub fn created_count(&self) -> usize {
        self.inner.lock().created
    }

    pub fn revoked_count(&self) -> usize {
        self.inner.lock().revoked
    }

    fn revoke(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.live.remove(url).is_some() {
            inner.revoked += 1;
            true
        } else {
            false
        }
    }
}

/// Owned handle to one live object URL
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    store: BlobStore,
    released: bool,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Bytes behind this URL while it is live
    pub fn blob(&self) -> Option<Blob> {
        if self.released { None } else { self.store.get(&self.url) }
    }

    /// Revoke the URL. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        let revoked = self.store.revoke(&self.url);
        debug!(url = %self.url, "Released object URL");
        revoked
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for ObjectUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ObjectUrl {}
