//! Watcher module for registered documentation folders.
//!
//! Raw notify events flow through the [`PathFilter`], are coalesced per path
//! by a [`Debouncer`], and leave a [`FolderWatch`] as [`FileChangeEvent`]s on
//! an unbounded channel consumed by the hub's dispatch task.

mod debouncer;
mod error;
mod event;
mod filter;
mod folder_watch;
mod registry;

pub use debouncer::{Debouncer, EmitFn, DEFAULT_DEBOUNCE_WINDOW};
pub use error::WatcherError;
pub use event::{ChangeKind, FileChangeEvent, FolderId};
pub use filter::{
    is_hidden_file, is_ignored_path, is_markdown_file, PathFilter, DEFAULT_IGNORED_DIRS,
};
pub use folder_watch::{
    classify_event, ChangeSender, FolderWatch, WatchOptions, DEFAULT_POLL_INTERVAL,
    DEFAULT_STOP_TIMEOUT,
};
pub use registry::WatchRegistry;
