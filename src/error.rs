//! Error types for receipt composition and rendering.

use std::io;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a document.
///
/// None of these are retried: composition stops at the first error and the
/// caller decides what to do with whatever was already placed.
#[derive(Error, Debug)]
pub enum Error {
    /// The attribute bag is missing something the composer needs.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An inline-markup fragment could not be parsed.
    #[error("markup error: {0}")]
    Markup(#[from] MarkupError),

    /// A logo could not be read, fetched or decoded.
    #[error("failed to load image from {location}: {reason}")]
    Resource { location: String, reason: String },

    /// A font file could not be read or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// The page renderer rejected a placement or PDF emission failed.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error when reading inputs or writing outputs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attribute or layout JSON could not be (de)serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn resource(location: impl Into<String>, reason: impl ToString) -> Self {
        Error::Resource {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration errors, raised before anything is placed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required top-level attribute is absent from a non-empty bag.
    #[error("missing required attribute `{0}`")]
    MissingKey(&'static str),

    /// A company field needed by the composer is absent or blank.
    #[error("company is missing required field `{0}`")]
    MissingCompanyField(&'static str),

    /// The process-wide default font may only be set once.
    #[error("the default font has already been set")]
    DefaultFontAlreadySet,
}

/// Malformed inline markup. Offsets are byte positions in the fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unexpected end of input inside a tag starting at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("tag <{tag}> opened at byte {offset} is never closed")]
    UnclosedTag { tag: String, offset: usize },

    #[error("closing tag </{found}> at byte {offset} does not match open tag <{expected}>")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing tag </{tag}> at byte {offset} has no matching open tag")]
    UnmatchedClosingTag { tag: String, offset: usize },

    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },
}
