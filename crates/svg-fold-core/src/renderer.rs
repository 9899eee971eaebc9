//! Two-phase decoration update.
//!
//! Phase one replays the decorations last computed for the document's
//! current version, synchronously, so switching back to a rendered tab does
//! not flash. The update then yields exactly once. Phase two re-resolves the
//! document, recomputes the folded set and decorations, and repaints only
//! when the folded set changed or the editor shows different glyphs.

use crate::fold_state::{FoldedLineSet, is_folded};
use crate::host::{Decoration, EditorHost, EditorView, HostDocument, TextDocument};
use crate::icon;
use crate::manager::FoldManager;
use crate::scanner::RegionSnapshot;
use crate::settings::Settings;
use std::sync::Arc;
use tower_lsp_server::ls_types::{Position, Range};

/// Decorations computed for one document version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSnapshot {
    pub version: i32,
    pub decorations: Vec<Decoration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Repaint even if the folded set did not change (e.g. theme switch).
    pub force: bool,
}

impl UpdateOptions {
    pub const fn forced() -> Self {
        Self { force: true }
    }
}

/// What a single [`FoldManager::update`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Document language is not configured for svg folding.
    Skipped,
    /// First visit with auto-fold on: folded everything, no render.
    AutoFolded,
    /// The editor lost its document.
    Aborted,
    /// A newer update for the same editor took over after the yield.
    Superseded,
    Rendered {
        /// Whether decorations were applied in the second phase.
        applied: bool,
        decorations: usize,
    },
}

impl<H: EditorHost> FoldManager<H> {
    /// Refreshes the svg glyph decorations of `editor`.
    ///
    /// Never fails: every problem degrades to "no visual change this cycle".
    pub async fn update(&self, editor: &Arc<H::Editor>, options: UpdateOptions) -> UpdateOutcome {
        let Some(document) = editor.document() else {
            tracing::debug!("update skipped: editor has no document");
            return UpdateOutcome::Aborted;
        };

        let settings = self.settings();
        if !settings.supports(document.language_id()) {
            tracing::debug!(
                "update skipped: language {} not supported",
                document.language_id()
            );
            return UpdateOutcome::Skipped;
        }

        if settings.auto_fold && !self.autofolded.contains(&document) {
            self.autofolded.insert(&document, ());
            tracing::debug!("auto-folding document on first visit");
            if let Err(e) = self.fold_all(editor).await {
                tracing::warn!("auto-fold failed: {}", e);
            }
            return UpdateOutcome::AutoFolded;
        }

        let token = self.begin_update(editor);
        let replayed = self.replay_cached(editor, &document);
        drop(document);

        tokio::task::yield_now().await;

        if !self.is_latest(editor, token) {
            tracing::debug!("update superseded by a newer request");
            return UpdateOutcome::Superseded;
        }
        let Some(document) = editor.document() else {
            tracing::debug!("update aborted: document closed during yield");
            return UpdateOutcome::Aborted;
        };

        let snapshot = self.regions.get(&document);
        let (folded, decorations) =
            self.compute(editor.as_ref(), document.as_ref(), &snapshot, &settings);

        let redraw = self.fold_state.needs_redraw(editor, &folded, options.force);
        // Another view of the same document may have produced the replayed
        // set, so compare against what this editor actually shows.
        let stale = self
            .painted
            .get(editor)
            .is_none_or(|shown| shown.decorations != decorations);
        let applied = redraw || stale;
        tracing::trace!(
            "fold state: {} folded, redraw={}, stale={}, replayed={}, force={}",
            folded.len(),
            redraw,
            stale,
            replayed,
            options.force
        );

        let count = decorations.len();
        let fresh = Arc::new(DecorationSnapshot {
            version: snapshot.version,
            decorations,
        });
        if applied {
            editor.apply_decorations(&fresh.decorations);
        }

        self.fold_state.record(editor, folded);
        self.painted.insert(editor, Arc::clone(&fresh));
        self.decorations.insert(&document, fresh);

        UpdateOutcome::Rendered {
            applied,
            decorations: count,
        }
    }

    /// Instant replay. Returns true when a cached set for the current version
    /// exists, whether or not it had to be re-applied.
    fn replay_cached(&self, editor: &Arc<H::Editor>, document: &Arc<HostDocument<H>>) -> bool {
        let Some(cached) = self.decorations.get(document) else {
            return false;
        };
        if cached.version != document.version() {
            return false;
        }

        let already_painted = self
            .painted
            .get(editor)
            .is_some_and(|painted| Arc::ptr_eq(&painted, &cached));
        if !already_painted {
            editor.apply_decorations(&cached.decorations);
            self.painted.insert(editor, cached);
        }
        true
    }

    fn compute(
        &self,
        editor: &H::Editor,
        document: &HostDocument<H>,
        snapshot: &RegionSnapshot,
        settings: &Settings,
    ) -> (FoldedLineSet, Vec<Decoration>) {
        let visible = editor.visible_ranges();
        let color = settings.stroke_color(self.host.theme_kind().is_light());

        let mut folded = FoldedLineSet::new();
        let mut decorations = Vec::new();
        for region in snapshot.regions.iter().filter(|r| r.is_multiline()) {
            let line = region.start.line;
            if !is_folded(&visible, line) {
                continue;
            }
            folded.insert(line);
            decorations.push(Decoration {
                range: Range::new(
                    region.start,
                    Position::new(line, document.line_length(line)),
                ),
                glyph_uri: icon::synthesize(&region.raw_text, color, settings.font_size),
            });
        }
        (folded, decorations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ColorThemeKind, LineRange};
    use crate::test_utils::test_helpers::{MockEditor, MockHost, multiline_svg_doc};
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn manager(host: &Arc<MockHost>) -> FoldManager<MockHost> {
        FoldManager::new(Arc::clone(host))
    }

    #[tokio::test]
    async fn test_unsupported_language_is_skipped() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("rust", "<svg>\n</svg>", 1);
        let outcome = manager(&host).update(&editor, UpdateOptions::default()).await;
        assert_eq!(outcome, UpdateOutcome::Skipped);
        assert!(editor.applied().is_empty());
    }

    #[tokio::test]
    async fn test_closed_editor_aborts() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", "<svg>\n</svg>", 1);
        editor.close();
        let outcome = manager(&host).update(&editor, UpdateOptions::default()).await;
        assert_eq!(outcome, UpdateOutcome::Aborted);
    }

    #[tokio::test]
    async fn test_collapsed_region_gets_one_decoration() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        editor.fold(4, 6);

        let outcome = manager(&host).update(&editor, UpdateOptions::default()).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );

        let applied = editor.applied();
        let last = applied.last().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].range.start, Position::new(4, 0));
        assert_eq!(last[0].range.end.line, 4);
        assert_eq!(last[0].range.end.character, 24);
        assert!(last[0].glyph_uri.starts_with("data:image/svg+xml;utf8,"));
    }

    #[tokio::test]
    async fn test_expanded_region_renders_nothing() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        let outcome = manager(&host).update(&editor, UpdateOptions::default()).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 0
            }
        );
    }

    #[tokio::test]
    async fn test_second_cycle_without_change_does_not_repaint() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        editor.fold(4, 6);
        let manager = manager(&host);

        manager.update(&editor, UpdateOptions::default()).await;
        let calls = editor.applied().len();

        let outcome = manager.update(&editor, UpdateOptions::default()).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: false,
                decorations: 1
            }
        );
        assert_eq!(editor.applied().len(), calls);
    }

    #[tokio::test]
    async fn test_fold_change_repaints() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        let manager = manager(&host);

        manager.update(&editor, UpdateOptions::default()).await;
        editor.fold(4, 6);
        manager.update(&editor, UpdateOptions::default()).await;

        assert_eq!(editor.applied().last().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_theme_switch_with_force_repaints() {
        let host = MockHost::with_languages(&["html"]);
        host.set_theme(ColorThemeKind::Dark);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        editor.fold(4, 6);
        let manager = manager(&host);

        manager.update(&editor, UpdateOptions::default()).await;
        let dark = editor.applied().last().unwrap()[0].glyph_uri.clone();
        assert!(dark.contains("%23ccccccaa"));

        // Same fold set, but the glyph colors on screen are out of date.
        host.set_theme(ColorThemeKind::Light);
        let unforced = manager.update(&editor, UpdateOptions::default()).await;
        assert_eq!(
            unforced,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
        let repainted = editor.applied().last().unwrap()[0].glyph_uri.clone();
        assert!(repainted.contains("%23222222dd"));

        let calls = editor.applied().len();
        let forced = manager.update(&editor, UpdateOptions::forced()).await;
        assert_eq!(
            forced,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
        assert_eq!(editor.applied().len(), calls + 1);
        let light = editor.applied().last().unwrap()[0].glyph_uri.clone();
        assert!(light.contains("%23222222dd"));
    }

    #[test]
    fn test_new_editor_replays_cached_decorations() {
        let host = MockHost::with_languages(&["html"]);
        let first = MockEditor::open("html", &multiline_svg_doc(), 1);
        first.fold(4, 6);
        let manager = manager(&host);
        tokio_test::block_on(manager.update(&first, UpdateOptions::default()));

        // Same document shown in a fresh view, e.g. after a tab switch.
        let second = MockEditor::for_document(first.current_document());
        second.fold(4, 6);

        let mut update = task::spawn(manager.update(&second, UpdateOptions::default()));
        assert_pending!(update.poll());
        // Replay landed before the yield.
        assert_eq!(second.applied().len(), 1);
        assert_eq!(second.applied()[0].len(), 1);

        let outcome = update.poll();
        // No previous fold state for this view, so phase two repaints too.
        assert_ready_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
    }

    #[test]
    fn test_replay_skipped_for_other_version() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        editor.fold(4, 6);
        let manager = manager(&host);
        tokio_test::block_on(manager.update(&editor, UpdateOptions::default()));
        let calls = editor.applied().len();

        editor.current_document().replace(multiline_svg_doc() + "\n", 2);
        let mut update = task::spawn(manager.update(&editor, UpdateOptions::default()));
        assert_pending!(update.poll());
        assert_eq!(editor.applied().len(), calls);

        // The trailing newline leaves the glyph unchanged, so the screen is
        // already correct.
        let outcome = update.poll();
        assert_ready_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: false,
                decorations: 1
            }
        );
        assert_eq!(editor.applied().len(), calls);
    }

    #[tokio::test]
    async fn test_split_views_keep_their_own_glyphs() {
        let host = MockHost::with_languages(&["html"]);
        let left = MockEditor::open("html", &multiline_svg_doc(), 1);
        left.fold(4, 6);
        let right = MockEditor::for_document(left.current_document());
        let manager = manager(&host);

        manager.update(&left, UpdateOptions::default()).await;
        manager.update(&right, UpdateOptions::default()).await;
        assert!(right.applied().last().unwrap().is_empty());

        // The replay paints the right view's empty set onto the folded left
        // view; phase two has to put the glyph back.
        let outcome = manager.update(&left, UpdateOptions::default()).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
        assert_eq!(left.applied().last().unwrap().len(), 1);

        let calls = left.applied().len();
        manager.update(&left, UpdateOptions::default()).await;
        assert_eq!(left.applied().len(), calls);
    }

    #[test]
    fn test_document_closed_during_yield_writes_nothing() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        let document = editor.current_document();
        let manager = manager(&host);

        let mut update = task::spawn(manager.update(&editor, UpdateOptions::default()));
        assert_pending!(update.poll());
        editor.close();
        assert_ready_eq!(update.poll(), UpdateOutcome::Aborted);

        assert!(manager.decorations.get(&document).is_none());
        assert!(manager.fold_state.previous(&editor).is_none());
    }

    #[test]
    fn test_latest_request_wins_after_yield() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        let manager = manager(&host);

        let mut older = task::spawn(manager.update(&editor, UpdateOptions::default()));
        assert_pending!(older.poll());
        let mut newer = task::spawn(manager.update(&editor, UpdateOptions::default()));
        assert_pending!(newer.poll());

        assert_ready_eq!(older.poll(), UpdateOutcome::Superseded);
        assert!(editor.applied().is_empty());
        assert_ready_eq!(
            newer.poll(),
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 0
            }
        );
        assert_eq!(editor.applied().len(), 1);
    }

    #[test]
    fn test_version_rechecked_after_yield() {
        let host = MockHost::with_languages(&["html"]);
        let editor = MockEditor::open("html", "nothing here", 1);
        editor.set_visible(vec![LineRange::new(0, 0)]);
        let manager = manager(&host);

        let mut update = task::spawn(manager.update(&editor, UpdateOptions::default()));
        assert_pending!(update.poll());
        editor.current_document().replace("<svg>\n</svg>", 2);

        assert_ready_eq!(
            update.poll(),
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
        let cached = manager.decorations.get(&editor.current_document()).unwrap();
        assert_eq!(cached.version, 2);
    }

    #[tokio::test]
    async fn test_auto_fold_runs_once_per_document() {
        let host = MockHost::with_settings(json!({
            "supportedLanguages": ["html"],
            "autoFold": true
        }));
        let editor = MockEditor::open("html", &multiline_svg_doc(), 1);
        let manager = manager(&host);

        let first = manager.update(&editor, UpdateOptions::default()).await;
        assert_eq!(first, UpdateOutcome::AutoFolded);
        assert_eq!(host.fold_calls().len(), 1);
        assert!(editor.applied().is_empty());

        let second = manager.update(&editor, UpdateOptions::default()).await;
        assert_eq!(
            second,
            UpdateOutcome::Rendered {
                applied: true,
                decorations: 1
            }
        );
        assert_eq!(host.fold_calls().len(), 1);
    }
}
