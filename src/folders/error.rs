//! Folder service error types.

use std::path::PathBuf;

use crate::store::StoreError;
use crate::watcher::FolderId;

/// Errors returned by folder registration, lookup and file access.
#[derive(thiserror::Error, Debug)]
pub enum FolderError {
    /// Request field failed validation.
    #[error("{0}")]
    Validation(String),

    /// Path to register does not exist.
    #[error("path does not exist")]
    PathNotExists(PathBuf),

    /// Path to register is not a directory.
    #[error("path is not a directory")]
    PathNotDirectory(PathBuf),

    /// Path is a protected system location.
    #[error("system protected paths cannot be registered")]
    PathDenied(PathBuf),

    /// Path is already registered.
    #[error("path already registered")]
    PathAlreadyRegistered(String),

    /// Folder id is not a positive integer.
    #[error("invalid folder id")]
    InvalidId(FolderId),

    /// No folder with this id.
    #[error("folder not found")]
    NotFound(FolderId),

    /// Folder is registered but its directory is gone.
    #[error("folder path does not exist")]
    FolderPathMissing(String),

    /// File request carried no path.
    #[error("path is required")]
    PathRequired,

    /// Requested file does not exist.
    #[error("file not found")]
    FileNotFound(PathBuf),

    /// Requested path is a directory.
    #[error("path is not a file")]
    NotAFile(PathBuf),

    /// Requested file is outside every registered folder or is a symlink.
    #[error("access denied")]
    AccessDenied(PathBuf),

    /// Requested file is not markdown.
    #[error("only markdown files allowed")]
    NotMarkdown(PathBuf),

    /// Reading the file failed.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
