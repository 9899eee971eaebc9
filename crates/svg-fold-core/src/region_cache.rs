use crate::host::TextDocument;
use crate::scanner::{RegionSnapshot, scan_document};
use crate::weak_cache::WeakCache;
use std::sync::Arc;

/// Per-document memo of the region scanner, keyed by content version.
///
/// At most one snapshot exists per document. A version mismatch replaces the
/// whole snapshot; it is never patched.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use svg_fold_core::{RegionCache, TextBuffer};
///
/// let cache = RegionCache::new();
/// let doc = Arc::new(TextBuffer::new("html", "<svg>\n</svg>", 1));
///
/// let first = cache.get(&doc);
/// let second = cache.get(&doc);
/// assert!(Arc::ptr_eq(&first, &second));
///
/// doc.replace("<svg></svg>", 2);
/// assert_eq!(cache.get(&doc).version, 2);
/// ```
pub struct RegionCache<D> {
    entries: WeakCache<D, Arc<RegionSnapshot>>,
}

impl<D: TextDocument> RegionCache<D> {
    pub fn new() -> Self {
        Self {
            entries: WeakCache::new(),
        }
    }

    /// Returns the snapshot for the document's current version, scanning on
    /// a miss.
    pub fn get(&self, document: &Arc<D>) -> Arc<RegionSnapshot> {
        let version = document.version();
        if let Some(cached) = self.entries.get(document)
            && cached.version == version
        {
            tracing::trace!("region cache hit at version {}", version);
            return cached;
        }

        tracing::debug!("region cache miss at version {}, scanning", version);
        let snapshot = Arc::new(scan_document(document.as_ref()));
        self.entries.insert(document, Arc::clone(&snapshot));
        snapshot
    }

    /// Number of documents with a live snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<D: TextDocument> Default for RegionCache<D> {
    fn default() -> Self {
        Self::new()
    }
}
