//! Host event wiring.
//!
//! Each host notification maps onto one renderer or batch call. Renders run
//! as detached tokio tasks; the returned handles are only for callers that
//! want to observe the outcome.

use crate::batch::BatchOutcome;
use crate::error::Result;
use crate::host::EditorHost;
use crate::manager::FoldManager;
use crate::rate_limit::{RateLimitOptions, RateLimiter};
use crate::renderer::{UpdateOptions, UpdateOutcome};
use crate::weak_cache::WeakCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Throttle window for visible-range events.
pub const VISIBLE_RANGES_THROTTLE: Duration = Duration::from_millis(100);

type RefreshLimiter<H> = Arc<RateLimiter<Arc<<H as EditorHost>::Editor>>>;

/// Routes host events into a [`FoldManager`].
pub struct EventRouter<H: EditorHost> {
    manager: Arc<FoldManager<H>>,
    window: Duration,
    /// One throttle per editor, so a burst in one view never swallows the
    /// trailing refresh of another.
    visible_ranges: WeakCache<H::Editor, RefreshLimiter<H>>,
}

impl<H: EditorHost> EventRouter<H> {
    pub fn new(manager: Arc<FoldManager<H>>) -> Self {
        Self::with_throttle(manager, VISIBLE_RANGES_THROTTLE)
    }

    pub fn with_throttle(manager: Arc<FoldManager<H>>, window: Duration) -> Self {
        Self {
            manager,
            window,
            visible_ranges: WeakCache::new(),
        }
    }

    pub fn manager(&self) -> &Arc<FoldManager<H>> {
        &self.manager
    }

    /// Initial render for the editor active at startup.
    pub fn activate(&self, active: Option<Arc<H::Editor>>) -> Option<JoinHandle<UpdateOutcome>> {
        tracing::info!("svg-fold activated");
        active.map(|editor| spawn_update(&self.manager, editor, UpdateOptions::default()))
    }

    /// Scroll or fold toggle. Throttled, leading and trailing.
    pub fn visible_ranges_changed(&self, editor: Arc<H::Editor>) {
        let limiter = self.visible_ranges.get_or_insert_with(&editor, || {
            let target = Arc::clone(&self.manager);
            Arc::new(RateLimiter::new(
                RateLimitOptions::throttle(self.window),
                move |editor| {
                    spawn_update(&target, editor, UpdateOptions::default());
                },
            ))
        });
        limiter.call(editor);
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.visible_ranges
            .values()
            .iter()
            .any(|limiter| limiter.is_pending())
    }

    pub fn active_editor_changed(
        &self,
        editor: Option<Arc<H::Editor>>,
    ) -> Option<JoinHandle<UpdateOutcome>> {
        editor.map(|editor| spawn_update(&self.manager, editor, UpdateOptions::default()))
    }

    /// Forced refresh when svg-fold settings changed; colors may differ.
    pub fn configuration_changed(
        &self,
        affects_svg_fold: bool,
        active: Option<Arc<H::Editor>>,
    ) -> Option<JoinHandle<UpdateOutcome>> {
        if !affects_svg_fold {
            return None;
        }
        tracing::debug!("configuration changed, refreshing");
        active.map(|editor| spawn_update(&self.manager, editor, UpdateOptions::forced()))
    }

    /// Forced refresh: the folded set is unchanged but every glyph color is.
    pub fn theme_changed(
        &self,
        active: Option<Arc<H::Editor>>,
    ) -> Option<JoinHandle<UpdateOutcome>> {
        tracing::debug!("color theme changed, refreshing");
        active.map(|editor| spawn_update(&self.manager, editor, UpdateOptions::forced()))
    }

    pub async fn fold_all_command(&self, active: Option<Arc<H::Editor>>) -> Result<BatchOutcome> {
        match active {
            Some(editor) => self.manager.fold_all(&editor).await,
            None => Ok(BatchOutcome::default()),
        }
    }

    pub async fn unfold_all_command(&self, active: Option<Arc<H::Editor>>) -> Result<BatchOutcome> {
        match active {
            Some(editor) => self.manager.unfold_all(&editor).await,
            None => Ok(BatchOutcome::default()),
        }
    }

    /// Drops every pending throttled refresh.
    pub fn dispose(&self) {
        for limiter in self.visible_ranges.values() {
            limiter.cancel();
        }
        tracing::debug!("svg-fold event router disposed");
    }
}

fn spawn_update<H: EditorHost>(
    manager: &Arc<FoldManager<H>>,
    editor: Arc<H::Editor>,
    options: UpdateOptions,
) -> JoinHandle<UpdateOutcome> {
    let manager = Arc::clone(manager);
    tokio::spawn(async move { manager.update(&editor, options).await })
}
