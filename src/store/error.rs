//! Folder store error types.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the folder registry.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Failed to open or create the database.
    #[error("Failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A folder with the same path is already stored.
    #[error("Folder path already registered: {0}")]
    DuplicatePath(String),

    /// Failed to execute SQL.
    #[error("Database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,

    /// Failed to create the data directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
