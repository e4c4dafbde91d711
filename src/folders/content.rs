//! Markdown file access restricted to registered folders.

use std::path::{Path, PathBuf};

use super::error::FolderError;
use crate::watcher::is_markdown_file;

/// Read a markdown file that lives under one of `registered_roots`.
///
/// Both the file and the roots are canonicalised before the containment
/// check, so `..` segments cannot escape a root.
///
/// # Errors
///
/// Checked in order: empty path, missing file, directory, symlink,
/// non-markdown extension, outside every root, read failure.
pub async fn read_markdown(
    path: &str,
    registered_roots: &[PathBuf],
) -> Result<String, FolderError> {
    if path.trim().is_empty() {
        return Err(FolderError::PathRequired);
    }
    let path = PathBuf::from(path);

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|_| FolderError::FileNotFound(path.clone()))?;
    if metadata.is_dir() {
        return Err(FolderError::NotAFile(path));
    }

    let link_metadata = tokio::fs::symlink_metadata(&path)
        .await
        .map_err(|_| FolderError::FileNotFound(path.clone()))?;
    if link_metadata.file_type().is_symlink() {
        tracing::warn!(path = %path.display(), "Refusing to read symlink");
        return Err(FolderError::AccessDenied(path));
    }

    if !is_markdown_file(&path) {
        return Err(FolderError::NotMarkdown(path));
    }

    let real_path = tokio::fs::canonicalize(&path)
        .await
        .map_err(|_| FolderError::FileNotFound(path.clone()))?;
    if !is_under_any_root(&real_path, registered_roots).await {
        tracing::warn!(path = %path.display(), "File is outside registered folders");
        return Err(FolderError::AccessDenied(path));
    }

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| FolderError::Read { path, source })
}

async fn is_under_any_root(real_path: &Path, roots: &[PathBuf]) -> bool {
    for root in roots {
        let Ok(real_root) = tokio::fs::canonicalize(root).await else {
            continue;
        };
        if real_path != real_root && real_path.starts_with(&real_root) {
            return true;
        }
    }
    false
}
