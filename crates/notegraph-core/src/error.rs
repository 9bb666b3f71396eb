//! Error types for the graph store and its object storage

use notegraph_parser::{Slug, SlugError};
use thiserror::Error;

/// Errors raised by an [`crate::storage::ObjectStore`] backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// The object exists but its bytes are not UTF-8
    #[error("Object is not valid UTF-8 text: {0}")]
    InvalidText(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Create a generic backend error
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Errors surfaced by the note service
///
/// Every variant maps to a stable machine-readable code via
/// [`NotegraphError::code`], which API layers hand to clients unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotegraphError {
    #[error("Note not found: {0}")]
    NoteNotFound(Slug),

    #[error("File not found: {0}")]
    FileNotFound(Slug),

    #[error("Pinned note not found: {0}")]
    PinnedNoteNotFound(Slug),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),

    #[error("Slug already exists: {0}")]
    SlugExists(Slug),

    #[error("Alias already exists: {0}")]
    AliasExists(Slug),

    #[error("Invalid note structure: {0}")]
    InvalidNoteStructure(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for note service operations
pub type NotegraphResult<T> = Result<T, NotegraphError>;

impl NotegraphError {
    /// Stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoteNotFound(_) => "NOTE_NOT_FOUND",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::PinnedNoteNotFound(_) => "PINNED_NOTE_NOT_FOUND",
            Self::InvalidSlug(_) => "INVALID_SLUG",
            Self::InvalidAlias(_) => "INVALID_ALIAS",
            Self::SlugExists(_) => "SLUG_EXISTS",
            Self::AliasExists(_) => "ALIAS_EXISTS",
            Self::InvalidNoteStructure(_) => "INVALID_NOTE_STRUCTURE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<SlugError> for NotegraphError {
    fn from(err: SlugError) -> Self {
        Self::InvalidSlug(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: StorageError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(err.is_not_found());

        let err: StorageError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_invalid_text_is_a_storage_error() {
        let err = NotegraphError::from(StorageError::InvalidText("bad.subtext".into()));
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(
            err.to_string(),
            "Object is not valid UTF-8 text: bad.subtext"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            NotegraphError::NoteNotFound("a".into()).code(),
            "NOTE_NOT_FOUND"
        );
        assert_eq!(NotegraphError::AliasExists("a".into()).code(), "ALIAS_EXISTS");
        assert_eq!(
            NotegraphError::from(StorageError::backend("down")).code(),
            "STORAGE_ERROR"
        );
        assert_eq!(NotegraphError::from(SlugError::Empty).code(), "INVALID_SLUG");
    }
}
