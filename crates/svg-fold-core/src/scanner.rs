//! `<svg>` block detection.
//!
//! Scanning is a pure function of the document text: identical text always
//! yields identical regions, which is what lets the region cache key on the
//! document version alone.

use crate::host::TextDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp_server::ls_types::{FoldingRange, FoldingRangeKind, Position};

/// Non-greedy, case-insensitive, spans line breaks.
static SVG_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<svg.*?</svg>").unwrap());

/// One detected `<svg>…</svg>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub raw_text: String,
    pub start: Position,
    pub end: Position,
}

impl Region {
    /// True when the block spans more than one line and can be folded.
    pub const fn is_multiline(&self) -> bool {
        self.end.line > self.start.line
    }

    /// The folding range for this region, if it spans several lines.
    pub fn folding_range(&self) -> Option<FoldingRange> {
        self.is_multiline().then(|| FoldingRange {
            start_line: self.start.line,
            end_line: self.end.line,
            kind: Some(FoldingRangeKind::Region),
            ..Default::default()
        })
    }
}

/// Result of one scan, tagged with the version of the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSnapshot {
    pub version: i32,
    pub regions: Vec<Region>,
    pub folding_ranges: Vec<FoldingRange>,
}

/// Scans `text` for `<svg>` blocks.
///
/// `to_position` maps a byte offset into `text` to a position.
///
/// # Examples
///
/// ```
/// use svg_fold_core::scanner::scan_text;
/// use svg_fold_core::LineIndex;
///
/// let text = "<p>\n<svg>\n</svg>";
/// let index = LineIndex::new(text);
/// let snapshot = scan_text(text, 1, |offset| index.offset_to_position(text, offset));
///
/// assert_eq!(snapshot.regions.len(), 1);
/// assert_eq!(snapshot.folding_ranges[0].start_line, 1);
/// assert_eq!(snapshot.folding_ranges[0].end_line, 2);
/// ```
pub fn scan_text(
    text: &str,
    version: i32,
    to_position: impl Fn(usize) -> Position,
) -> RegionSnapshot {
    let regions: Vec<Region> = SVG_BLOCK
        .find_iter(text)
        .map(|m| Region {
            raw_text: m.as_str().to_string(),
            start: to_position(m.start()),
            end: to_position(m.end()),
        })
        .collect();

    let folding_ranges = regions.iter().filter_map(Region::folding_range).collect();

    RegionSnapshot {
        version,
        regions,
        folding_ranges,
    }
}

/// Scans a host document.
///
/// The version is read before the text, so a concurrent edit can only make
/// the snapshot look older than its content and never newer.
pub fn scan_document<D: TextDocument + ?Sized>(document: &D) -> RegionSnapshot {
    let version = document.version();
    let text = document.text();
    scan_text(&text, version, |offset| document.offset_to_position(offset))
}
