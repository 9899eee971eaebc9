//! In-memory [`TextDocument`] with a stable identity across edits.

use crate::host::TextDocument;
use crate::line_index::LineIndex;
use std::sync::{PoisonError, RwLock};
use tower_lsp_server::ls_types::Position;

#[derive(Debug)]
struct BufferState {
    text: String,
    version: i32,
    lines: LineIndex,
}

/// Full-text document buffer.
///
/// Hosts that receive whole-document syncs (such as the language server)
/// keep one `Arc<TextBuffer>` per open document and call [`replace`] on
/// every change, so the buffer identity stays stable while its version
/// advances.
///
/// [`replace`]: TextBuffer::replace
///
/// # Examples
///
/// ```
/// use svg_fold_core::{TextBuffer, TextDocument};
///
/// let buffer = TextBuffer::new("html", "<svg></svg>", 1);
/// buffer.replace("<p></p>", 2);
/// assert_eq!(buffer.version(), 2);
/// assert_eq!(buffer.text(), "<p></p>");
/// ```
#[derive(Debug)]
pub struct TextBuffer {
    language_id: String,
    state: RwLock<BufferState>,
}

impl TextBuffer {
    pub fn new(language_id: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        let text = text.into();
        let lines = LineIndex::new(&text);
        Self {
            language_id: language_id.into(),
            state: RwLock::new(BufferState {
                text,
                version,
                lines,
            }),
        }
    }

    /// Replaces the whole content and bumps the version.
    ///
    /// Out-of-order updates carrying an older version are ignored.
    pub fn replace(&self, text: impl Into<String>, version: i32) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if version < state.version {
            tracing::debug!(
                "ignoring stale buffer update: version {} < {}",
                version,
                state.version
            );
            return false;
        }
        let text = text.into();
        state.lines = LineIndex::new(&text);
        state.text = text;
        state.version = version;
        true
    }
}

impl TextDocument for TextBuffer {
    fn text(&self) -> String {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .text
            .clone()
    }

    fn version(&self) -> i32 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn offset_to_position(&self, offset: usize) -> Position {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.lines.offset_to_position(&state.text, offset)
    }

    fn line_length(&self, line: u32) -> u32 {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.lines.line_length(&state.text, line)
    }
}
