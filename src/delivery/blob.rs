//! Short-lived transferable payload references.
//!
//! A [`BlobRef`] lets a receiver fetch a large payload without the bytes
//! being embedded in the message body, mirroring object-URL semantics: the
//! reference is valid for the duration of one message exchange and is
//! revoked as soon as that exchange settles.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Opaque handle to a payload held by a [`BlobStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(u64);

/// Registry of in-flight transferable payloads.
#[derive(Debug, Default)]
pub struct BlobStore {
    entries: Mutex<HashMap<u64, Bytes>>,
    next_id: AtomicU64,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload and hand out a reference to it.
    pub fn insert(&self, payload: Bytes) -> BlobRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .expect("blob store poisoned")
            .insert(id, payload);
        BlobRef(id)
    }

    /// Dereference, if the handle is still live.
    pub fn resolve(&self, blob: &BlobRef) -> Option<Bytes> {
        self.entries
            .lock()
            .expect("blob store poisoned")
            .get(&blob.0)
            .cloned()
    }

    /// Invalidate a reference. Resolving it afterwards yields `None`.
    pub fn revoke(&self, blob: &BlobRef) {
        self.entries
            .lock()
            .expect("blob store poisoned")
            .remove(&blob.0);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("blob store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
