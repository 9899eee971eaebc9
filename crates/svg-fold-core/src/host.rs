//! Narrow interface to the host editor.
//!
//! The core never owns documents or editors. Hosts hand them over as `Arc`s;
//! the allocation identity is what every cache is keyed on.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tower_lsp_server::ls_types::{Position, Range};

/// A text document owned by the host.
///
/// `version` must increase on every content edit. Implementations are read
/// by the core only; nothing here mutates the document.
pub trait TextDocument: Send + Sync + 'static {
    /// Full document text.
    fn text(&self) -> String;

    /// Monotonically increasing content version.
    fn version(&self) -> i32;

    /// Language identifier (e.g. `"html"`, `"markdown"`).
    fn language_id(&self) -> &str;

    /// Maps a byte offset into [`text`](Self::text) to a line/column position.
    fn offset_to_position(&self, offset: usize) -> Position;

    /// Length of `line` in the same units as [`Position::character`].
    fn line_length(&self, line: u32) -> u32;
}

/// An inclusive range of visible lines in an editor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// A cursor selection; `anchor == active` is a plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub anchor: Position,
    pub active: Position,
}

impl Selection {
    pub const fn new(anchor: Position, active: Position) -> Self {
        Self { anchor, active }
    }

    pub const fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            active: position,
        }
    }
}

/// Request to paint one inline glyph over a text range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub range: Range,
    pub glyph_uri: String,
}

/// One editor view onto a document.
pub trait EditorView: Send + Sync + 'static {
    type Document: TextDocument;

    /// The document shown in this view, or `None` once the view was closed.
    fn document(&self) -> Option<Arc<Self::Document>>;

    fn visible_ranges(&self) -> Vec<LineRange>;

    /// Replaces every svg-fold decoration in this view.
    fn apply_decorations(&self, decorations: &[Decoration]);

    fn selections(&self) -> Vec<Selection>;

    fn set_selections(&self, selections: Vec<Selection>);
}

/// Color theme kinds reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorThemeKind {
    Light,
    #[default]
    Dark,
    HighContrast,
    HighContrastLight,
}

impl ColorThemeKind {
    pub const fn is_light(self) -> bool {
        matches!(self, Self::Light | Self::HighContrastLight)
    }
}

/// Key/value configuration lookup, `getSetting(key) -> value`.
pub trait SettingsSource {
    fn setting(&self, key: &str) -> Option<serde_json::Value>;
}

/// Looks up `key` directly, then as a dotted path into nested objects.
impl SettingsSource for serde_json::Value {
    fn setting(&self, key: &str) -> Option<serde_json::Value> {
        if let Some(value) = self.get(key) {
            return Some(value.clone());
        }
        let pointer = format!("/{}", key.replace('.', "/"));
        self.pointer(&pointer).cloned()
    }
}

/// Editor-wide services: settings, theme and transactional folding.
#[async_trait]
pub trait EditorHost: SettingsSource + Send + Sync + 'static {
    type Editor: EditorView;

    fn theme_kind(&self) -> ColorThemeKind;

    /// Folds the regions under `selections` as one transaction.
    async fn execute_fold(&self, editor: &Self::Editor, selections: &[Selection]) -> Result<()>;

    /// Unfolds the regions under `selections` as one transaction.
    async fn execute_unfold(&self, editor: &Self::Editor, selections: &[Selection])
    -> Result<()>;
}

/// Shorthand for the document type behind a host's editors.
pub type HostDocument<H> = <<H as EditorHost>::Editor as EditorView>::Document;
