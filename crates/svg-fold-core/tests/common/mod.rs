//! Common test utilities for integration tests.
//!
//! `Workbench` is a minimal editor host: a fixed set of visible line ranges
//! per view and fold commands that rewrite them.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use svg_fold_core::{
    ColorThemeKind, Decoration, EditorHost, EditorView, LineRange, Result, Selection,
    SettingsSource, TextBuffer, TextDocument,
};

pub(crate) struct View {
    document: Arc<TextBuffer>,
    visible: Mutex<Vec<LineRange>>,
    selections: Mutex<Vec<Selection>>,
    pub(crate) paints: Mutex<Vec<Vec<Decoration>>>,
}

impl View {
    pub(crate) fn new(document: Arc<TextBuffer>) -> Arc<Self> {
        let lines = document.text().lines().count().max(1) as u32;
        Arc::new(Self {
            document,
            visible: Mutex::new(vec![LineRange::new(0, lines - 1)]),
            selections: Mutex::new(Vec::new()),
            paints: Mutex::new(Vec::new()),
        })
    }

    /// Collapses the region spanning `start..=end`.
    pub(crate) fn collapse(&self, start: u32, end: u32) {
        let mut visible = self.visible.lock().unwrap();
        let mut next = Vec::new();
        for range in visible.iter() {
            if range.contains(start) && range.contains(end) {
                next.push(LineRange::new(range.start, start));
                if end < range.end {
                    next.push(LineRange::new(end + 1, range.end));
                }
            } else {
                next.push(*range);
            }
        }
        *visible = next;
    }

    pub(crate) fn paint_count(&self) -> usize {
        self.paints.lock().unwrap().len()
    }

    pub(crate) fn last_paint(&self) -> Vec<Decoration> {
        self.paints.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl EditorView for View {
    type Document = TextBuffer;

    fn document(&self) -> Option<Arc<TextBuffer>> {
        Some(Arc::clone(&self.document))
    }

    fn visible_ranges(&self) -> Vec<LineRange> {
        self.visible.lock().unwrap().clone()
    }

    fn apply_decorations(&self, decorations: &[Decoration]) {
        self.paints.lock().unwrap().push(decorations.to_vec());
    }

    fn selections(&self) -> Vec<Selection> {
        self.selections.lock().unwrap().clone()
    }

    fn set_selections(&self, selections: Vec<Selection>) {
        *self.selections.lock().unwrap() = selections;
    }
}

pub(crate) struct Workbench {
    pub(crate) settings: Mutex<Value>,
    pub(crate) theme: Mutex<ColorThemeKind>,
    /// Selections seen by the host fold command.
    pub(crate) folded_under: Mutex<Vec<Selection>>,
}

impl Workbench {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            settings: Mutex::new(json!({ "supportedLanguages": ["html", "markdown"] })),
            theme: Mutex::new(ColorThemeKind::Dark),
            folded_under: Mutex::new(Vec::new()),
        })
    }
}

impl SettingsSource for Workbench {
    fn setting(&self, key: &str) -> Option<Value> {
        self.settings.lock().unwrap().setting(key)
    }
}

#[async_trait]
impl EditorHost for Workbench {
    type Editor = View;

    fn theme_kind(&self) -> ColorThemeKind {
        *self.theme.lock().unwrap()
    }

    async fn execute_fold(&self, editor: &View, selections: &[Selection]) -> Result<()> {
        // The real command folds under the current selections.
        assert_eq!(editor.selections(), selections);
        self.folded_under
            .lock()
            .unwrap()
            .extend_from_slice(selections);
        for selection in selections {
            editor.collapse(selection.anchor.line, selection.active.line);
        }
        Ok(())
    }

    async fn execute_unfold(&self, _editor: &View, _selections: &[Selection]) -> Result<()> {
        Ok(())
    }
}
