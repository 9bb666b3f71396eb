//! Error types for slug validation

use thiserror::Error;

/// Slug validation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The slug is empty
    #[error("Slug is empty")]
    Empty,

    /// The slug exceeds the maximum length
    #[error("Slug exceeds {max} characters: {slug}")]
    TooLong { slug: String, max: usize },

    /// The slug contains characters or segments that are not allowed
    #[error("Invalid slug: {0}")]
    Invalid(String),

    /// A note slug must not carry a file extension
    #[error("Note slugs must not contain '.': {0}")]
    ContainsDot(String),
}

/// Result type for slug validation
pub type SlugResult<T> = Result<T, SlugError>;
