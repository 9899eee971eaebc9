//! Outline glyph synthesis for folded `<svg>` blocks.
//!
//! Only `viewBox` and `<path d="…">` geometry survive. Everything else in the
//! source markup (fills, transforms, styles) is dropped and the paths are
//! redrawn as thin strokes in the theme color.

use once_cell::sync::Lazy;
use regex::Regex;

static VIEW_BOX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"viewBox="([^"]*)""#).unwrap());

static PATH_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<path\b[^>]*?\sd=(?:"([^"]*)"|'([^']*)')[^>]*>"#).unwrap()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const DATA_URI_PREFIX: &str = "data:image/svg+xml;utf8,";

/// Builds the minified outline SVG for `raw_svg`.
///
/// # Examples
///
/// ```
/// use svg_fold_core::icon::outline_svg;
///
/// let svg = outline_svg(r#"<svg><path fill="red" d="M0 0L1 1"/></svg>"#, "#fff", 12.0);
/// assert!(svg.contains(r#"<path d="M0 0L1 1" stroke-linecap="round" stroke-linejoin="round"/>"#));
/// assert!(!svg.contains("red"));
/// ```
pub fn outline_svg(raw_svg: &str, stroke_color: &str, font_size: f32) -> String {
    let view_box = VIEW_BOX
        .captures(raw_svg)
        .and_then(|caps| caps.get(1))
        .map(|m| format!(r#" viewBox="{}""#, m.as_str()))
        .unwrap_or_default();

    let paths: String = PATH_DATA
        .captures_iter(raw_svg)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|d| {
            format!(
                r#"<path d="{}" stroke-linecap="round" stroke-linejoin="round"/>"#,
                d.as_str()
            )
        })
        .collect();

    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}"{view_box} fill="none" stroke-width="1" stroke="{stroke_color}">{paths}</svg>"#,
        size = font_size,
    );

    WHITESPACE.replace_all(&svg, " ").trim().to_string()
}

/// Synthesizes the glyph for `raw_svg` as an embeddable `data:` URI.
///
/// The payload is percent-encoded with only `A-Z a-z 0-9 - . _ ~ ! *` left
/// as-is; in particular `'`, `(` and `)` are always escaped. Identical
/// inputs always produce identical output.
pub fn synthesize(raw_svg: &str, stroke_color: &str, font_size: f32) -> String {
    let svg = outline_svg(raw_svg, stroke_color, font_size);
    format!("{}{}", DATA_URI_PREFIX, encode_payload(&svg))
}

fn encode_payload(svg: &str) -> String {
    urlencoding::encode(svg)
        .replace("%21", "!")
        .replace("%2A", "*")
}
