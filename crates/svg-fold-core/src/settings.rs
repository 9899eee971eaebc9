use crate::error::FoldError;
use crate::host::SettingsSource;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Configuration section identifier.
pub const IDENTIFIER: &str = "inline-svg-fold";

/// Setting keys understood by svg-fold.
pub mod keys {
    pub const SUPPORTED_LANGUAGES: &str = "supportedLanguages";
    pub const RENDERED_SVG_COLOR_LIGHT: &str = "renderedSVGColorLight";
    pub const RENDERED_SVG_COLOR_DARK: &str = "renderedSVGColorDark";
    pub const AUTO_FOLD: &str = "autoFold";
    /// Host editor font size, used as the glyph size.
    pub const EDITOR_FONT_SIZE: &str = "editor.fontSize";
}

/// Host command identifiers.
pub mod commands {
    pub const FOLD_ALL_SVG: &str = "inline-svg-fold.foldAllSvg";
    pub const UNFOLD_ALL_SVG: &str = "inline-svg-fold.unfoldAllSvg";
}

/// Resolved svg-fold settings.
///
/// Can be read key by key from a host ([`Settings::load`]) or deserialized
/// from a JSON settings object. Missing fields use sensible defaults.
///
/// # Defaults
///
/// - `supported_languages`: `[]`
/// - `rendered_svg_color_light`: `"#222222dd"`
/// - `rendered_svg_color_dark`: `"#ccccccaa"`
/// - `auto_fold`: `false`
/// - `font_size`: `14.0`
///
/// # Examples
///
/// ```
/// use svg_fold_core::Settings;
///
/// let json = r#"{ "supportedLanguages": ["html", "markdown"], "autoFold": true }"#;
/// let settings: Settings = serde_json::from_str(json).unwrap();
///
/// assert!(settings.supports("html"));
/// assert!(settings.auto_fold);
/// assert_eq!(settings.rendered_svg_color_dark, "#ccccccaa");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub supported_languages: Vec<String>,
    #[serde(rename = "renderedSVGColorLight", default = "default_color_light")]
    pub rendered_svg_color_light: String,
    #[serde(rename = "renderedSVGColorDark", default = "default_color_dark")]
    pub rendered_svg_color_dark: String,
    #[serde(default)]
    pub auto_fold: bool,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supported_languages: Vec::new(),
            rendered_svg_color_light: default_color_light(),
            rendered_svg_color_dark: default_color_dark(),
            auto_fold: false,
            font_size: default_font_size(),
        }
    }
}

fn default_color_light() -> String {
    "#222222dd".to_string()
}

fn default_color_dark() -> String {
    "#ccccccaa".to_string()
}

const fn default_font_size() -> f32 {
    14.0
}

impl Settings {
    /// Reads every key from `source`, falling back per key.
    ///
    /// A value of the wrong type is logged and replaced by its fallback.
    pub fn load(source: &(impl SettingsSource + ?Sized)) -> Self {
        let defaults = Self::default();
        Self {
            supported_languages: read_or(
                source,
                keys::SUPPORTED_LANGUAGES,
                defaults.supported_languages,
            ),
            rendered_svg_color_light: read_or(
                source,
                keys::RENDERED_SVG_COLOR_LIGHT,
                defaults.rendered_svg_color_light,
            ),
            rendered_svg_color_dark: read_or(
                source,
                keys::RENDERED_SVG_COLOR_DARK,
                defaults.rendered_svg_color_dark,
            ),
            auto_fold: read_or(source, keys::AUTO_FOLD, defaults.auto_fold),
            font_size: read_or(source, keys::EDITOR_FONT_SIZE, defaults.font_size),
        }
    }

    /// Whether documents of `language_id` get svg folding.
    pub fn supports(&self, language_id: &str) -> bool {
        self.supported_languages
            .iter()
            .any(|language| language == language_id)
    }

    /// Stroke color for the given theme lightness.
    pub fn stroke_color(&self, light_theme: bool) -> &str {
        if light_theme {
            &self.rendered_svg_color_light
        } else {
            &self.rendered_svg_color_dark
        }
    }
}

/// Reads one typed setting. `Ok(None)` when the key is absent.
pub fn read_setting<T: DeserializeOwned>(
    source: &(impl SettingsSource + ?Sized),
    key: &str,
) -> crate::Result<Option<T>> {
    match source.setting(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| FoldError::InvalidSetting {
                key: key.to_string(),
                source,
            }),
    }
}

fn read_or<T: DeserializeOwned>(
    source: &(impl SettingsSource + ?Sized),
    key: &str,
    fallback: T,
) -> T {
    match read_setting(source, key) {
        Ok(Some(value)) => value,
        Ok(None) => fallback,
        Err(e) => {
            tracing::warn!("{}, using fallback", e);
            fallback
        }
    }
}
