//! Byte offset to LSP position conversion.

use tower_lsp_server::ls_types::Position;

/// Pre-computed line start byte offsets for O(log n) position lookups.
///
/// Columns are reported in UTF-16 code units, matching LSP positions.
///
/// # Examples
///
/// ```
/// use svg_fold_core::LineIndex;
///
/// let text = "ab\ncd";
/// let index = LineIndex::new(text);
/// let pos = index.offset_to_position(text, 4);
/// assert_eq!((pos.line, pos.character), (1, 1));
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in content.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts byte offset to LSP Position (line, UTF-16 character).
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn offset_to_position(&self, content: &str, offset: usize) -> Position {
        let offset = offset.min(content.len());
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line];

        let character = content
            .get(line_start..offset)
            .map(|prefix| prefix.chars().map(|c| c.len_utf16() as u32).sum())
            .unwrap_or(0);

        Position::new(line as u32, character)
    }

    /// Length of `line` in UTF-16 units, excluding the line terminator.
    pub fn line_length(&self, content: &str, line: u32) -> u32 {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return 0;
        };
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map_or(content.len(), |&next| next - 1);

        content
            .get(start..end)
            .map(|text| text.trim_end_matches('\r'))
            .map(|text| text.chars().map(|c| c.len_utf16() as u32).sum())
            .unwrap_or(0)
    }
}
