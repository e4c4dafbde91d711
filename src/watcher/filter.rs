//! Relevance filtering for raw filesystem events.
//!
//! Only non-hidden markdown files outside hidden or ignored directories
//! reach the debouncer. Everything else is dropped without side effects.

use std::collections::HashSet;
use std::path::{Component, Path};

/// Directory names ignored when no explicit set is configured.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    ".env",
    "dist",
    "build",
    "coverage",
    ".git",
    ".vscode",
    ".idea",
    ".next",
];

/// Returns `true` if the path has a `.md` extension, compared case-insensitively.
#[must_use]
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Returns `true` if the final path segment starts with a dot.
#[must_use]
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Returns `true` if any segment is hidden or in [`DEFAULT_IGNORED_DIRS`].
#[must_use]
pub fn is_ignored_path(path: &Path) -> bool {
    PathFilter::default().is_ignored_path(path)
}

/// Decides which raw events are relevant for a watched folder.
#[derive(Debug, Clone)]
pub struct PathFilter {
    ignored_dirs: HashSet<String>,
}

impl PathFilter {
    /// Create a filter with a custom ignore set.
    #[must_use]
    pub fn new<I, S>(ignored_dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_dirs: ignored_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if any segment starts with a dot or matches the ignore set.
    ///
    /// The `.` and `..` segments never count as hidden.
    #[must_use]
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(segment) => {
                let segment = segment.to_string_lossy();
                segment.starts_with('.') || self.ignored_dirs.contains(&*segment)
            }
            _ => false,
        })
    }

    /// Returns `true` if a file event at `path` should be debounced and emitted.
    ///
    /// Directory events must be excluded by the caller before this check.
    #[must_use]
    pub fn is_relevant(&self, path: &Path) -> bool {
        is_markdown_file(path) && !is_hidden_file(path) && !self.is_ignored_path(path)
    }

    /// Configured ignore set.
    #[must_use]
    pub fn ignored_dirs(&self) -> &HashSet<String> {
        &self.ignored_dirs
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_DIRS.iter().copied())
    }
}
