//! Watch handle binding one folder to one notify watcher and one debouncer.

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::debouncer::{Debouncer, EmitFn, DEFAULT_DEBOUNCE_WINDOW};
use super::error::WatcherError;
use super::event::{ChangeKind, FileChangeEvent, FolderId};
use super::filter::PathFilter;

/// Sender half of the channel carrying logical changes to the dispatcher.
pub type ChangeSender = mpsc::UnboundedSender<FileChangeEvent>;

/// Default interval between scans when polling.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on waiting for a watcher to shut down.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Tuning shared by every folder watch.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period before a path's change is emitted.
    pub debounce: Duration,
    /// Scan the tree periodically instead of using native notifications.
    pub use_polling: bool,
    /// Scan interval when polling.
    pub poll_interval: Duration,
    /// How long teardown waits for the watcher thread.
    pub stop_timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE_WINDOW,
            use_polling: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// An active recursive watch over one registered folder.
pub struct FolderWatch {
    folder_id: FolderId,
    root: PathBuf,
    watcher: Option<Box<dyn Watcher + Send>>,
    debouncer: Arc<Debouncer>,
    stop_timeout: Duration,
}

impl FolderWatch {
    /// Start watching `root` recursively.
    ///
    /// Relevant events are debounced per path and sent on `changes` tagged
    /// with `folder_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing or not a directory, if no
    /// tokio runtime is running, or if the notify watcher fails to start.
    pub fn start(
        folder_id: FolderId,
        root: PathBuf,
        filter: Arc<PathFilter>,
        options: &WatchOptions,
        changes: ChangeSender,
    ) -> Result<Self, WatcherError> {
        if !root.exists() {
            return Err(WatcherError::PathNotFound(root));
        }
        if !root.is_dir() {
            return Err(WatcherError::NotADirectory(root));
        }

        let emit: EmitFn = Arc::new(move |path: &Path, kind| {
            tracing::debug!(
                folder_id,
                path = %path.display(),
                event = %kind,
                "File change detected"
            );
            if changes
                .send(FileChangeEvent::new(kind, path, folder_id))
                .is_err()
            {
                tracing::debug!(folder_id, "Dispatcher closed, dropping change");
            }
        });
        let debouncer = Arc::new(Debouncer::new(options.debounce, emit)?);

        let handler_debouncer = Arc::clone(&debouncer);
        let handler = move |result: notify::Result<Event>| match result {
            Ok(event) => route_event(&event, &filter, &handler_debouncer),
            Err(e) => tracing::warn!(folder_id, error = %e, "File watcher error"),
        };

        let mut watcher: Box<dyn Watcher + Send> = if options.use_polling {
            let config = Config::default().with_poll_interval(options.poll_interval);
            Box::new(PollWatcher::new(handler, config)?)
        } else {
            Box::new(RecommendedWatcher::new(handler, Config::default())?)
        };
        watcher.watch(&root, RecursiveMode::Recursive)?;

        tracing::info!(
            folder_id,
            path = %root.display(),
            polling = options.use_polling,
            "Folder watch started"
        );

        Ok(Self {
            folder_id,
            root,
            watcher: Some(watcher),
            debouncer,
            stop_timeout: options.stop_timeout,
        })
    }

    /// Stop the watcher, then cancel every pending timer.
    ///
    /// The watcher goes first so no new timers can be scheduled while the
    /// pending ones are cancelled. Returns the number of cancelled timers.
    pub fn stop(mut self) -> usize {
        if let Some(watcher) = self.watcher.take() {
            stop_watcher(watcher, &self.root, self.stop_timeout);
        }
        let cancelled = self.debouncer.close();

        tracing::info!(
            folder_id = self.folder_id,
            cancelled_timers = cancelled,
            "Folder watch stopped"
        );
        cancelled
    }

    /// Folder id this watch reports changes for.
    #[must_use]
    pub fn folder_id(&self) -> FolderId {
        self.folder_id
    }

    /// Root directory being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of paths waiting for their quiet window to elapse.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.debouncer.pending_count()
    }
}

impl Drop for FolderWatch {
    fn drop(&mut self) {
        self.watcher.take();
        self.debouncer.close();
    }
}

impl std::fmt::Debug for FolderWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderWatch")
            .field("folder_id", &self.folder_id)
            .field("root", &self.root)
            .field("active", &self.watcher.is_some())
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

/// Unwatch and drop the watcher on a helper thread, waiting at most `timeout`.
fn stop_watcher(mut watcher: Box<dyn Watcher + Send>, root: &Path, timeout: Duration) {
    if let Err(e) = watcher.unwatch(root) {
        tracing::debug!(path = %root.display(), error = %e, "Unwatch failed");
    }

    let (done_tx, done_rx) = std_mpsc::channel();
    thread::spawn(move || {
        drop(watcher);
        let _ = done_tx.send(());
    });

    if done_rx.recv_timeout(timeout).is_err() {
        tracing::warn!(
            path = %root.display(),
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Watcher did not shut down in time"
        );
    }
}

/// Filter a raw notify event and feed relevant paths to the debouncer.
fn route_event(event: &Event, filter: &PathFilter, debouncer: &Debouncer) {
    for (path, kind) in classify_event(event) {
        if kind != ChangeKind::Deleted && path.is_dir() {
            continue;
        }
        if !filter.is_relevant(&path) {
            continue;
        }
        debouncer.schedule(path, kind);
    }
}

/// Map a raw notify event to per-path change kinds.
///
/// Renames surface as a delete of the old path and a create of the new one.
/// Folder create/remove events and access events produce nothing.
#[must_use]
pub fn classify_event(event: &Event) -> Vec<(PathBuf, ChangeKind)> {
    let all = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };

    match event.kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => Vec::new(),
        EventKind::Create(_) => all(ChangeKind::Created),
        EventKind::Remove(_) => all(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => all(ChangeKind::Deleted),
            RenameMode::To => all(ChangeKind::Created),
            RenameMode::Both if event.paths.len() >= 2 => vec![
                (event.paths[0].clone(), ChangeKind::Deleted),
                (event.paths[1].clone(), ChangeKind::Created),
            ],
            _ => event
                .paths
                .iter()
                .map(|p| {
                    let kind = if p.exists() {
                        ChangeKind::Created
                    } else {
                        ChangeKind::Deleted
                    };
                    (p.clone(), kind)
                })
                .collect(),
        },
        EventKind::Modify(_) => all(ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}
