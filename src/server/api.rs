//! Request and response types for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::store::Folder;
use crate::watcher::FolderId;

/// Response for GET /.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub service: String,
}

impl Default for RootResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            service: "DocBridge API".to_string(),
        }
    }
}

/// Response for GET /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Folders currently watched.
    pub watching: usize,
    /// Live WebSocket clients.
    pub connections: usize,
}

impl HealthResponse {
    #[must_use]
    pub fn healthy(watching: usize, connections: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            watching,
            connections,
        }
    }
}

/// Body for POST /api/folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterFolderRequest {
    /// Display name.
    pub name: String,
    /// Absolute directory path.
    pub path: String,
}

/// Response for GET /api/folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderListResponse {
    pub folders: Vec<Folder>,
}

/// Response for DELETE /api/folders/:id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFolderResponse {
    pub success: bool,
    pub deleted_id: FolderId,
}

impl DeleteFolderResponse {
    #[must_use]
    pub fn deleted(id: FolderId) -> Self {
        Self {
            success: true,
            deleted_id: id,
        }
    }
}

/// Query parameters for GET /api/folders/:id/tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeQuery {
    /// Only list markdown files. Defaults to `true`.
    #[serde(default = "default_md_only")]
    pub md_only: bool,
}

fn default_md_only() -> bool {
    true
}

/// Query parameters for GET /api/files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileQuery {
    pub path: Option<String>,
}

/// Response for GET /api/files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContentResponse {
    pub content: String,
}
