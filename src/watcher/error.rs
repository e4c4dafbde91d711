//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while starting or stopping a folder watch.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Folder id is already being watched.
    #[error("Folder {0} is already being watched")]
    AlreadyWatching(i64),

    /// Folder id is not being watched.
    #[error("Folder {0} is not being watched")]
    NotWatching(i64),

    /// Watch root does not exist.
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// Watch root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No tokio runtime is available to run debounce timers.
    #[error("No tokio runtime available for debounce timers")]
    NoRuntime,

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
