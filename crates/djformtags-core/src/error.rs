//! Error types for djformtags.
//!
//! [`FormTagsError`] covers everything that can fail while loading, parsing,
//! or rendering templates, plus configuration loading. Conditions the tags
//! recover from locally (an unresolvable field, an unknown widget kind) never
//! surface as errors.

use thiserror::Error;

/// The primary error type for the djformtags crates.
#[derive(Error, Debug)]
pub enum FormTagsError {
    // ── Templates ────────────────────────────────────────────────────

    /// A template contains invalid syntax, or a tag was called with the
    /// wrong arguments.
    #[error("Template syntax error: {0}")]
    TemplateSyntaxError(String),

    /// The requested template could not be found by any loader.
    #[error("Template does not exist: {0}")]
    TemplateDoesNotExist(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormTagsError {
    /// Returns `true` if this error means a template could not be located.
    pub const fn is_template_missing(&self) -> bool {
        matches!(self, Self::TemplateDoesNotExist(_))
    }
}

/// A convenience type alias for `Result<T, FormTagsError>`.
pub type FormTagsResult<T> = Result<T, FormTagsError>;
