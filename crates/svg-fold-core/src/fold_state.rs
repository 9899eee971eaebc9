//! Fold state derived from an editor's visible line ranges.
//!
//! The host owns the authoritative fold state. A region counts as folded
//! when the line right after its start line is hidden.

use crate::host::LineRange;
use crate::weak_cache::WeakCache;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// Start lines of the regions currently collapsed in one editor view.
pub type FoldedLineSet = HashSet<u32>;

/// True when `line + 1` is not inside any visible range.
pub fn is_folded(visible: &[LineRange], line: u32) -> bool {
    let next = line.saturating_add(1);
    !visible.iter().any(|range| range.contains(next))
}

/// Order-insensitive set equality.
pub fn are_equal_sets<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

/// Remembers the last observed [`FoldedLineSet`] per editor.
pub struct FoldStateTracker<E> {
    previous: WeakCache<E, FoldedLineSet>,
}

impl<E> FoldStateTracker<E> {
    pub fn new() -> Self {
        Self {
            previous: WeakCache::new(),
        }
    }

    pub fn previous(&self, editor: &Arc<E>) -> Option<FoldedLineSet> {
        self.previous.get(editor)
    }

    /// Decides whether `current` requires repainting `editor`.
    pub fn needs_redraw(&self, editor: &Arc<E>, current: &FoldedLineSet, force: bool) -> bool {
        if force {
            return true;
        }
        match self.previous.get(editor) {
            Some(previous) => !are_equal_sets(&previous, current),
            None => true,
        }
    }

    pub fn record(&self, editor: &Arc<E>, folded: FoldedLineSet) {
        self.previous.insert(editor, folded);
    }
}

impl<E> Default for FoldStateTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}
