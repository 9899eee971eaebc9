//! Fold-all / unfold-all over every svg region of a document.
//!
//! The host only folds under the cursor, so a batch temporarily replaces the
//! editor's selections with one selection per qualifying region, runs the
//! host command once, and puts the user's selections back.

use crate::error::Result;
use crate::fold_state::is_folded;
use crate::host::{EditorHost, EditorView, Selection, TextDocument};
use crate::manager::FoldManager;
use std::sync::Arc;
use tower_lsp_server::ls_types::Position;

/// Result of one batch command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Regions handed to the host fold/unfold command.
    pub affected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Fold,
    Unfold,
}

impl<H: EditorHost> FoldManager<H> {
    /// Folds every expanded svg region in `editor`.
    pub async fn fold_all(&self, editor: &Arc<H::Editor>) -> Result<BatchOutcome> {
        self.run_batch(editor, Direction::Fold).await
    }

    /// Unfolds every collapsed svg region in `editor`.
    pub async fn unfold_all(&self, editor: &Arc<H::Editor>) -> Result<BatchOutcome> {
        self.run_batch(editor, Direction::Unfold).await
    }

    async fn run_batch(
        &self,
        editor: &Arc<H::Editor>,
        direction: Direction,
    ) -> Result<BatchOutcome> {
        let Some(document) = editor.document() else {
            tracing::debug!("{:?} all skipped: editor has no document", direction);
            return Ok(BatchOutcome::default());
        };
        if !self.settings().supports(document.language_id()) {
            return Ok(BatchOutcome::default());
        }

        let snapshot = self.regions.get(&document);
        let visible = editor.visible_ranges();
        let want_folded = direction == Direction::Unfold;

        let targets: Vec<Selection> = snapshot
            .folding_ranges
            .iter()
            .filter(|range| is_folded(&visible, range.start_line) == want_folded)
            .map(|range| {
                Selection::new(
                    Position::new(range.start_line, 0),
                    Position::new(range.end_line, document.line_length(range.end_line)),
                )
            })
            .collect();

        if targets.is_empty() {
            tracing::debug!("{:?} all: nothing to do", direction);
            return Ok(BatchOutcome::default());
        }

        let original = editor.selections();
        editor.set_selections(targets.clone());

        let result = match direction {
            Direction::Fold => self.host.execute_fold(editor.as_ref(), &targets).await,
            Direction::Unfold => self.host.execute_unfold(editor.as_ref(), &targets).await,
        };

        editor.set_selections(original);

        match result {
            Ok(()) => {
                tracing::debug!("{:?} all: {} regions", direction, targets.len());
                Ok(BatchOutcome {
                    affected: targets.len(),
                })
            }
            Err(e) => {
                tracing::warn!("{:?} all failed: {}", direction, e);
                Err(e)
            }
        }
    }
}
