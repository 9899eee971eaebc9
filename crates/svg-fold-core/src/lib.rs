//! Core of svg-fold.
//!
//! Detects inline `<svg>…</svg>` blocks in text documents, offers them to the
//! editor as folding regions, and paints a small outline glyph of the image
//! on the first line of every collapsed block.
//!
//! The crate is host-agnostic: editors plug in through the traits in
//! [`host`]. Everything is cached per document version and keyed weakly on
//! document and editor identity, so closing either on the host side is all
//! the cleanup there is.
//!
//! # Modules
//!
//! - [`scanner`]: `<svg>` block detection
//! - [`region_cache`]: version-keyed scan memo
//! - [`fold_state`]: folded-set derivation and redraw suppression
//! - [`icon`]: glyph synthesis
//! - [`renderer`]: the two-phase decoration update
//! - [`batch`]: fold-all / unfold-all
//! - [`events`] and [`rate_limit`]: host event wiring

pub mod batch;
pub mod buffer;
pub mod error;
pub mod events;
pub mod fold_state;
pub mod host;
pub mod icon;
pub mod line_index;
pub mod manager;
pub mod rate_limit;
pub mod region_cache;
pub mod renderer;
pub mod scanner;
pub mod settings;
pub mod weak_cache;

mod test_utils;

// Re-export commonly used types
pub use batch::BatchOutcome;
pub use buffer::TextBuffer;
pub use error::{FoldError, Result};
pub use events::EventRouter;
pub use fold_state::{FoldStateTracker, FoldedLineSet, are_equal_sets, is_folded};
pub use host::{
    ColorThemeKind, Decoration, EditorHost, EditorView, HostDocument, LineRange, Selection,
    SettingsSource, TextDocument,
};
pub use line_index::LineIndex;
pub use manager::FoldManager;
pub use rate_limit::{RateLimitOptions, RateLimiter};
pub use region_cache::RegionCache;
pub use renderer::{DecorationSnapshot, UpdateOptions, UpdateOutcome};
pub use scanner::{Region, RegionSnapshot, scan_document, scan_text};
pub use settings::Settings;
pub use weak_cache::WeakCache;
