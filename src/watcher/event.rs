//! Logical change events delivered to connected clients.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned to a registered folder by the folder store.
pub type FolderId = i64;

/// Kind of change observed for a markdown file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// File was created (or renamed into place).
    Created,
    /// File contents or metadata changed.
    Modified,
    /// File was deleted (or renamed away).
    Deleted,
}

impl ChangeKind {
    /// Returns the wire representation of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debounced, filtered file change for one watched folder.
///
/// Serializes to the wire shape
/// `{"type":"file_change","event":...,"path":...,"folder_id":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "file_change")]
pub struct FileChangeEvent {
    /// What happened to the file.
    pub event: ChangeKind,
    /// Absolute path of the file.
    pub path: String,
    /// Folder whose watch observed the change.
    pub folder_id: FolderId,
}

impl FileChangeEvent {
    /// Create a new change event.
    #[must_use]
    pub fn new(event: ChangeKind, path: &Path, folder_id: FolderId) -> Self {
        Self {
            event,
            path: path.to_string_lossy().into_owned(),
            folder_id,
        }
    }
}

/// Tagged form used for decoding, so a foreign `type` is rejected.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedMessage {
    FileChange {
        event: ChangeKind,
        path: String,
        folder_id: FolderId,
    },
}

impl<'de> Deserialize<'de> for FileChangeEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let TaggedMessage::FileChange {
            event,
            path,
            folder_id,
        } = TaggedMessage::deserialize(deserializer)?;
        Ok(Self {
            event,
            path,
            folder_id,
        })
    }
}
