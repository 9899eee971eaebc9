use thiserror::Error;

/// Core error types for svg-fold.
///
/// Most conditions in the fold pipeline degrade to "no visual change this
/// cycle" and are reported through outcome enums instead. Errors are reserved
/// for failures a caller may want to surface, such as a host fold command
/// that did not go through.
///
/// # Examples
///
/// ```
/// use svg_fold_core::error::{FoldError, Result};
///
/// fn run_fold_command(accepted: bool) -> Result<()> {
///     if !accepted {
///         return Err(FoldError::Host("editor.fold rejected".into()));
///     }
///     Ok(())
/// }
///
/// assert!(run_fold_command(false).is_err());
/// ```
#[derive(Error, Debug)]
pub enum FoldError {
    #[error("host command failed: {0}")]
    Host(String),

    #[error("invalid value for setting {key}: {source}")]
    InvalidSetting {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for `Result<T, FoldError>`.
pub type Result<T> = std::result::Result<T, FoldError>;
