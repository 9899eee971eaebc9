//! Identity-keyed caches that never keep their keys alive.
//!
//! Entries are keyed by the address of an `Arc` allocation and hold only a
//! `Weak` back-reference. The weak reference pins the allocation (not the
//! value), so an address cannot be reused while its entry exists. Entries
//! whose key has no strong references left are invisible to lookups and are
//! dropped on the next write.

use dashmap::DashMap;
use std::sync::{Arc, Weak};

struct Entry<K, V> {
    key: Weak<K>,
    value: V,
}

/// Association map from `Arc<K>` identity to `V`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use svg_fold_core::WeakCache;
///
/// let cache = WeakCache::new();
/// let doc = Arc::new("document");
/// cache.insert(&doc, 42);
/// assert_eq!(cache.get(&doc), Some(42));
///
/// drop(doc);
/// assert_eq!(cache.len(), 0);
/// ```
pub struct WeakCache<K, V> {
    entries: DashMap<usize, Entry<K, V>>,
}

fn identity<K>(key: &Arc<K>) -> usize {
    Arc::as_ptr(key).cast::<()>() as usize
}

impl<K, V> WeakCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns a copy of the value stored for `key`.
    pub fn get(&self, key: &Arc<K>) -> Option<V>
    where
        V: Clone,
    {
        self.entries
            .get(&identity(key))
            .filter(|entry| entry.key.strong_count() > 0)
            .map(|entry| entry.value.clone())
    }

    pub fn contains(&self, key: &Arc<K>) -> bool {
        self.entries
            .get(&identity(key))
            .is_some_and(|entry| entry.key.strong_count() > 0)
    }

    /// Stores `value` for `key`, replacing any previous entry.
    pub fn insert(&self, key: &Arc<K>, value: V) {
        self.prune();
        self.entries.insert(
            identity(key),
            Entry {
                key: Arc::downgrade(key),
                value,
            },
        );
    }

    /// Returns the value stored for `key`, inserting `make()` first if there
    /// is none. Concurrent callers for the same key get the same value.
    pub fn get_or_insert_with(&self, key: &Arc<K>, make: impl FnOnce() -> V) -> V
    where
        V: Clone,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        self.prune();
        self.entries
            .entry(identity(key))
            .or_insert_with(|| Entry {
                key: Arc::downgrade(key),
                value: make(),
            })
            .value
            .clone()
    }

    /// Copies of every value whose key is still alive.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.entries
            .iter()
            .filter(|entry| entry.key.strong_count() > 0)
            .map(|entry| entry.value.clone())
            .collect()
    }

    pub fn remove(&self, key: &Arc<K>) -> Option<V> {
        self.entries
            .remove(&identity(key))
            .map(|(_, entry)| entry.value)
    }

    /// Drops every entry whose key is gone.
    pub fn prune(&self) {
        self.entries
            .retain(|_, entry| entry.key.strong_count() > 0);
    }

    /// Number of entries whose key is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for WeakCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for WeakCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakCache")
            .field("live_entries", &self.len())
            .finish()
    }
}
