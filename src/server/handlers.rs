//! HTTP handlers for the folder API.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tokio_util::sync::CancellationToken;

use super::api::{
    DeleteFolderResponse, FileContentResponse, FileQuery, FolderListResponse, HealthResponse,
    RegisterFolderRequest, RootResponse, TreeQuery,
};
use super::error::ApiError;
use crate::folders::{FolderService, FolderTree};
use crate::hub::ConnectionHub;
use crate::store::Folder;
use crate::watcher::FolderId;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Folder registration and file access.
    pub folders: FolderService,
    /// Broadcast hub for WebSocket clients.
    pub hub: Arc<ConnectionHub>,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(
        folders: FolderService,
        hub: Arc<ConnectionHub>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            folders,
            hub,
            shutdown,
        }
    }
}

/// GET / - Service banner.
pub async fn get_root() -> Json<RootResponse> {
    Json(RootResponse::default())
}

/// GET /health - Liveness plus watch and connection counts.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let watching = state.folders.watches().watching_count();
    let connections = state.hub.connection_count().await;
    Json(HealthResponse::healthy(watching, connections))
}

/// POST /api/folders - Register a folder and start watching it.
pub async fn post_folder(
    State(state): State<AppState>,
    payload: Result<Json<RegisterFolderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation {
        message: "Invalid request body".to_string(),
        details: Some(serde_json::Value::String(rejection.body_text())),
    })?;

    let folder = state.folders.register(&request.name, &request.path).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// GET /api/folders - List registered folders, newest first.
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<FolderListResponse>, ApiError> {
    let folders = state.folders.list().await?;
    Ok(Json(FolderListResponse { folders }))
}

/// GET /api/folders/:id/tree - Directory tree of a folder.
pub async fn get_folder_tree(
    State(state): State<AppState>,
    id: Result<Path<FolderId>, PathRejection>,
    query: Result<Query<TreeQuery>, QueryRejection>,
) -> Result<Json<FolderTree>, ApiError> {
    let Path(id) = id.map_err(|r| ApiError::validation(r.body_text()))?;
    let Query(query) = query.map_err(|r| ApiError::validation(r.body_text()))?;

    let tree = state.folders.tree(id, query.md_only).await?;
    Ok(Json(tree))
}

/// DELETE /api/folders/:id - Unregister a folder.
pub async fn delete_folder(
    State(state): State<AppState>,
    id: Result<Path<FolderId>, PathRejection>,
) -> Result<Json<DeleteFolderResponse>, ApiError> {
    let Path(id) = id.map_err(|r| ApiError::validation(r.body_text()))?;

    state.folders.delete(id).await?;
    Ok(Json(DeleteFolderResponse::deleted(id)))
}

/// GET /api/files?path= - Content of a markdown file under a registered folder.
pub async fn get_file_content(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<FileContentResponse>, ApiError> {
    let path = query.path.unwrap_or_default();
    let content = state.folders.read_file(&path).await?;
    Ok(Json(FileContentResponse { content }))
}
