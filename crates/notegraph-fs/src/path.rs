//! Mapping object paths onto the filesystem

use notegraph_core::{StorageError, StorageResult};
use std::path::{Path, PathBuf};

/// Resolve an object path below `root`
///
/// Object paths are relative and `/`-separated. Empty segments, `.` and
/// `..` are rejected so no object can escape the root.
pub fn resolve_object_path(root: &Path, object_path: &str) -> StorageResult<PathBuf> {
    let invalid = || StorageError::InvalidPath(object_path.to_string());

    if object_path.is_empty() || object_path.starts_with('/') || object_path.contains('\\') {
        return Err(invalid());
    }

    let mut resolved = root.to_path_buf();
    for segment in object_path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\0') {
            return Err(invalid());
        }
        resolved.push(segment);
    }
    Ok(resolved)
}

/// Turn a file below `root` back into its object path
pub(crate) fn object_path_of(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    Some(segments?.join("/"))
}
