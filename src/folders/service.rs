//! Folder registration and lifecycle, keeping the store and watches in step.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::content::read_markdown;
use super::error::FolderError;
use super::security::{default_deny_list, is_path_denied};
use super::tree::{build_tree, TreeNode};
use crate::store::{Folder, FolderStore, StoreError};
use crate::watcher::{FolderId, WatchRegistry};

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Tree listing of one registered folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderTree {
    pub id: FolderId,
    pub name: String,
    pub path: String,
    pub tree: TreeNode,
}

/// Coordinates the folder store with the watch registry.
#[derive(Debug, Clone)]
pub struct FolderService {
    store: FolderStore,
    watches: Arc<WatchRegistry>,
    deny_list: Arc<Vec<PathBuf>>,
}

impl FolderService {
    /// Create a service with the default deny list.
    #[must_use]
    pub fn new(store: FolderStore, watches: Arc<WatchRegistry>) -> Self {
        Self::with_deny_list(store, watches, default_deny_list())
    }

    /// Create a service with a custom deny list.
    #[must_use]
    pub fn with_deny_list(
        store: FolderStore,
        watches: Arc<WatchRegistry>,
        deny_list: Vec<PathBuf>,
    ) -> Self {
        Self {
            store,
            watches,
            deny_list: Arc::new(deny_list),
        }
    }

    /// Register a folder and start watching it.
    ///
    /// A watch that fails to start is logged; the folder stays registered.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or overlong name or an empty
    /// path, then checks in order that the path exists, is a directory, is
    /// not denied, and is not registered yet.
    pub async fn register(&self, name: &str, path: &str) -> Result<Folder, FolderError> {
        let name = validate_name(name)?;
        let path = normalize_path(path)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|_| FolderError::PathNotExists(PathBuf::from(&path)))?;
        if !metadata.is_dir() {
            return Err(FolderError::PathNotDirectory(PathBuf::from(&path)));
        }

        let resolved = tokio::fs::canonicalize(&path)
            .await
            .unwrap_or_else(|_| PathBuf::from(&path));
        if is_path_denied(Path::new(&path), &self.deny_list)
            || is_path_denied(&resolved, &self.deny_list)
        {
            tracing::warn!(path = %path, "Refusing to register protected path");
            return Err(FolderError::PathDenied(resolved));
        }

        if self.store.exists_by_path(path.clone()).await? {
            return Err(FolderError::PathAlreadyRegistered(path));
        }

        let folder = self.store.create(name, path).await.map_err(|e| match e {
            StoreError::DuplicatePath(path) => FolderError::PathAlreadyRegistered(path),
            other => FolderError::Store(other),
        })?;

        tracing::info!(folder_id = folder.id, path = %folder.path, "Folder registered");

        if !self.watches.add_folder(folder.id, &folder.path) {
            tracing::warn!(folder_id = folder.id, "Folder registered without an active watch");
        }

        Ok(folder)
    }

    /// All registered folders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn list(&self) -> Result<Vec<Folder>, FolderError> {
        Ok(self.store.find_all().await?)
    }

    /// Look up a registered folder.
    ///
    /// # Errors
    ///
    /// Returns [`FolderError::NotFound`] for an unknown id.
    pub async fn get(&self, id: FolderId) -> Result<Folder, FolderError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(FolderError::NotFound(id))
    }

    /// Stop watching a folder and remove it from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`FolderError::InvalidId`] for ids below 1 and
    /// [`FolderError::NotFound`] for unknown ids.
    pub async fn delete(&self, id: FolderId) -> Result<(), FolderError> {
        if id < 1 {
            return Err(FolderError::InvalidId(id));
        }
        self.get(id).await?;

        let watches = Arc::clone(&self.watches);
        let stopped = tokio::task::spawn_blocking(move || watches.remove_folder(id))
            .await
            .unwrap_or(false);
        if !stopped {
            tracing::debug!(folder_id = id, "Deleted folder had no active watch");
        }

        self.store.delete(id).await?;
        tracing::info!(folder_id = id, "Folder deleted");
        Ok(())
    }

    /// Directory tree of a registered folder.
    ///
    /// # Errors
    ///
    /// Returns [`FolderError::NotFound`] for an unknown id and
    /// [`FolderError::FolderPathMissing`] if the directory is gone.
    pub async fn tree(&self, id: FolderId, md_only: bool) -> Result<FolderTree, FolderError> {
        let folder = self.get(id).await?;

        if tokio::fs::metadata(&folder.path).await.is_err() {
            return Err(FolderError::FolderPathMissing(folder.path));
        }

        let root = PathBuf::from(&folder.path);
        let tree = tokio::task::spawn_blocking(move || build_tree(&root, md_only))
            .await
            .map_err(|_| FolderError::Store(StoreError::TaskCancelled))?;

        Ok(FolderTree {
            id: folder.id,
            name: folder.name,
            path: folder.path,
            tree,
        })
    }

    /// Read a markdown file under any registered folder.
    ///
    /// # Errors
    ///
    /// See [`read_markdown`].
    pub async fn read_file(&self, path: &str) -> Result<String, FolderError> {
        let roots: Vec<PathBuf> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .map(|f| PathBuf::from(f.path))
            .collect();
        read_markdown(path, &roots).await
    }

    /// Start a watch for every stored folder whose directory still exists.
    ///
    /// Returns the number of folders watched afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub async fn initialize_watchers(&self) -> Result<usize, FolderError> {
        let folders = self.store.find_all().await?;

        for folder in &folders {
            if tokio::fs::metadata(&folder.path).await.is_err() {
                tracing::warn!(
                    folder_id = folder.id,
                    path = %folder.path,
                    "Skipping orphaned folder"
                );
                continue;
            }
            self.watches.add_folder(folder.id, &folder.path);
        }

        let watching = self.watches.watching_count();
        tracing::info!(registered = folders.len(), watching, "Folder watches initialized");
        Ok(watching)
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &FolderStore {
        &self.store
    }

    /// Shared watch registry.
    #[must_use]
    pub fn watches(&self) -> &Arc<WatchRegistry> {
        &self.watches
    }
}

fn validate_name(name: &str) -> Result<String, FolderError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FolderError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(FolderError::Validation(format!(
            "name must be {MAX_NAME_LEN} characters or less"
        )));
    }
    Ok(name.to_string())
}

fn normalize_path(path: &str) -> Result<String, FolderError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(FolderError::Validation("path is required".to_string()));
    }
    let stripped = path.trim_end_matches('/');
    Ok(if stripped.is_empty() { "/" } else { stripped }.to_string())
}
