//! The fold manager: caches and host handle shared by the renderer and the
//! batch controller.

use crate::fold_state::FoldStateTracker;
use crate::host::{EditorHost, HostDocument, TextDocument};
use crate::region_cache::RegionCache;
use crate::renderer::DecorationSnapshot;
use crate::scanner::RegionSnapshot;
use crate::settings::Settings;
use crate::weak_cache::WeakCache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tower_lsp_server::ls_types::FoldingRange;

/// Owns every per-document and per-editor cache.
///
/// All caches are weakly keyed: closing a document or editor on the host
/// side is enough to release its entries. Nothing here is ever torn down
/// explicitly.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use svg_fold_core::{EditorHost, FoldManager, UpdateOptions};
/// # async fn example<H: EditorHost>(host: Arc<H>, editor: Arc<H::Editor>) {
/// let manager = FoldManager::new(host);
/// manager.update(&editor, UpdateOptions::default()).await;
/// # }
/// ```
pub struct FoldManager<H: EditorHost> {
    pub(crate) host: Arc<H>,
    pub(crate) regions: RegionCache<HostDocument<H>>,
    pub(crate) fold_state: FoldStateTracker<H::Editor>,
    pub(crate) decorations: WeakCache<HostDocument<H>, Arc<DecorationSnapshot>>,
    /// What each editor is currently showing.
    pub(crate) painted: WeakCache<H::Editor, Arc<DecorationSnapshot>>,
    pub(crate) autofolded: WeakCache<HostDocument<H>, ()>,
    generations: WeakCache<H::Editor, u64>,
    next_generation: AtomicU64,
}

impl<H: EditorHost> FoldManager<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self {
            host,
            regions: RegionCache::new(),
            fold_state: FoldStateTracker::new(),
            decorations: WeakCache::new(),
            painted: WeakCache::new(),
            autofolded: WeakCache::new(),
            generations: WeakCache::new(),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Current settings, read fresh from the host.
    pub fn settings(&self) -> Settings {
        Settings::load(self.host.as_ref())
    }

    /// Folding ranges for `document`, one per multi-line `<svg>` block.
    ///
    /// Empty for languages not listed in `supportedLanguages`.
    pub fn provide_folding_ranges(&self, document: &Arc<HostDocument<H>>) -> Vec<FoldingRange> {
        if !self.settings().supports(document.language_id()) {
            return Vec::new();
        }
        self.regions.get(document).folding_ranges.clone()
    }

    /// Region snapshot for the document's current version.
    pub fn regions(&self, document: &Arc<HostDocument<H>>) -> Arc<RegionSnapshot> {
        self.regions.get(document)
    }

    /// Registers a new update for `editor` and returns its token.
    pub(crate) fn begin_update(&self, editor: &Arc<H::Editor>) -> u64 {
        let token = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.generations.insert(editor, token);
        token
    }

    /// True if no later update for `editor` has started since `token`.
    pub(crate) fn is_latest(&self, editor: &Arc<H::Editor>, token: u64) -> bool {
        self.generations.get(editor) == Some(token)
    }
}
