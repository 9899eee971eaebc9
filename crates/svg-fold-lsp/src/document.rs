//! Open-document store.
//!
//! One `Arc<TextBuffer>` per URI for the lifetime of the open document.
//! Full-sync changes replace the buffer content in place, so the identity the
//! core caches key on survives edits and disappears on close.

use dashmap::DashMap;
use std::sync::Arc;
use svg_fold_core::TextBuffer;
use tower_lsp_server::ls_types::Uri;

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Uri, Arc<TextBuffer>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly opened document, replacing any stale entry.
    pub fn open(
        &self,
        uri: Uri,
        language_id: String,
        text: String,
        version: i32,
    ) -> Arc<TextBuffer> {
        let buffer = Arc::new(TextBuffer::new(language_id, text, version));
        self.documents.insert(uri, Arc::clone(&buffer));
        buffer
    }

    /// Applies a full-text change. Returns `false` for unknown documents and
    /// out-of-order versions.
    pub fn change(&self, uri: &Uri, text: String, version: i32) -> bool {
        match self.documents.get(uri) {
            Some(buffer) => buffer.replace(text, version),
            None => {
                tracing::debug!("change for unknown document: {:?}", uri);
                false
            }
        }
    }

    pub fn close(&self, uri: &Uri) -> Option<Arc<TextBuffer>> {
        self.documents.remove(uri).map(|(_, buffer)| buffer)
    }

    /// Clones the `Arc` out so the map shard lock is released immediately.
    pub fn get(&self, uri: &Uri) -> Option<Arc<TextBuffer>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
