//! Stored folder records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::watcher::FolderId;

/// A registered documentation folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}
