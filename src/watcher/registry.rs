//! Registry of active folder watches keyed by folder id.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::WatcherError;
use super::event::FolderId;
use super::filter::PathFilter;
use super::folder_watch::{ChangeSender, FolderWatch, WatchOptions};

/// Map entry for one folder id.
#[derive(Debug)]
enum Slot {
    Active(FolderWatch),
    /// Teardown in progress; the id stays reserved until it finishes.
    Stopping,
}

/// Owns every [`FolderWatch`] and serializes add/remove under one lock.
///
/// All operations report failure through their return value and the log;
/// none of them panic or propagate errors to the caller.
#[derive(Debug)]
pub struct WatchRegistry {
    watches: Mutex<HashMap<FolderId, Slot>>,
    filter: Arc<PathFilter>,
    options: WatchOptions,
    changes: ChangeSender,
}

impl WatchRegistry {
    /// Create a registry with the default filter and options.
    #[must_use]
    pub fn new(changes: ChangeSender) -> Self {
        Self::with_options(changes, PathFilter::default(), WatchOptions::default())
    }

    /// Create a registry with a custom filter and options.
    #[must_use]
    pub fn with_options(changes: ChangeSender, filter: PathFilter, options: WatchOptions) -> Self {
        Self {
            watches: Mutex::new(HashMap::new()),
            filter: Arc::new(filter),
            options,
            changes,
        }
    }

    /// Start watching `path` for `folder_id`.
    ///
    /// Returns `false` without side effects if the id is already watched or
    /// still stopping, the path is missing or not a directory, or the watcher
    /// fails to start.
    pub fn add_folder(&self, folder_id: FolderId, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let mut watches = self.lock();

        match watches.get(&folder_id) {
            Some(Slot::Active(_)) => {
                tracing::warn!(folder_id, "Folder is already being watched");
                return false;
            }
            Some(Slot::Stopping) => {
                tracing::warn!(folder_id, "Previous watch for folder is still stopping");
                return false;
            }
            None => {}
        }

        match FolderWatch::start(
            folder_id,
            path.to_path_buf(),
            Arc::clone(&self.filter),
            &self.options,
            self.changes.clone(),
        ) {
            Ok(watch) => {
                watches.insert(folder_id, Slot::Active(watch));
                true
            }
            Err(e @ (WatcherError::PathNotFound(_) | WatcherError::NotADirectory(_))) => {
                tracing::error!(folder_id, error = %e, "Cannot watch folder");
                false
            }
            Err(e) => {
                tracing::error!(
                    folder_id,
                    path = %path.display(),
                    error = %e,
                    "Failed to start folder watch"
                );
                false
            }
        }
    }

    /// Stop watching `folder_id`.
    ///
    /// The id is marked as stopping while the watch is torn down outside the
    /// lock, and is released only once teardown has finished. Returns `false`
    /// if the id was not being watched.
    pub fn remove_folder(&self, folder_id: FolderId) -> bool {
        let Some(watch) = self.begin_stop(folder_id) else {
            tracing::warn!(folder_id, "Folder is not being watched");
            return false;
        };

        watch.stop();
        self.finish_stop(folder_id);
        true
    }

    /// Remove every active watch.
    pub fn stop_all(&self) {
        for folder_id in self.folder_ids() {
            self.remove_folder(folder_id);
        }
        tracing::info!("All folder watches stopped");
    }

    /// Number of folders currently watched.
    #[must_use]
    pub fn watching_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    /// Whether `folder_id` is currently watched.
    #[must_use]
    pub fn is_watching(&self, folder_id: FolderId) -> bool {
        matches!(self.lock().get(&folder_id), Some(Slot::Active(_)))
    }

    /// Ids of all watched folders in ascending order.
    #[must_use]
    pub fn folder_ids(&self) -> Vec<FolderId> {
        let mut ids: Vec<FolderId> = self
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Active(_)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Root path watched for `folder_id`.
    #[must_use]
    pub fn root_of(&self, folder_id: FolderId) -> Option<PathBuf> {
        match self.lock().get(&folder_id) {
            Some(Slot::Active(watch)) => Some(watch.root().to_path_buf()),
            _ => None,
        }
    }

    /// Options applied to every new watch.
    #[must_use]
    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Take the active watch for `folder_id`, leaving a stopping marker.
    fn begin_stop(&self, folder_id: FolderId) -> Option<FolderWatch> {
        let mut watches = self.lock();
        match watches.remove(&folder_id) {
            Some(Slot::Active(watch)) => {
                watches.insert(folder_id, Slot::Stopping);
                Some(watch)
            }
            Some(Slot::Stopping) => {
                watches.insert(folder_id, Slot::Stopping);
                None
            }
            None => None,
        }
    }

    fn finish_stop(&self, folder_id: FolderId) {
        let mut watches = self.lock();
        if matches!(watches.get(&folder_id), Some(Slot::Stopping)) {
            watches.remove(&folder_id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FolderId, Slot>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
