//! Directory tree snapshots for the folder browser.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::watcher::{is_markdown_file, DEFAULT_IGNORED_DIRS};

/// Build output directories skipped only in tree listings.
pub const TREE_EXTRA_IGNORED_DIRS: &[&str] = &["target", "out"];

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
}

/// One node of a folder tree.
///
/// Files carry their absolute `path`; directories carry `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn directory(name: String, children: Vec<TreeNode>) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            path: None,
            children: Some(children),
        }
    }

    fn file(name: String, path: &Path) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            path: Some(path.to_string_lossy().into_owned()),
            children: None,
        }
    }
}

/// Build the tree for `root` with the default ignore set.
#[must_use]
pub fn build_tree(root: &Path, md_only: bool) -> TreeNode {
    let ignored: HashSet<String> = DEFAULT_IGNORED_DIRS
        .iter()
        .chain(TREE_EXTRA_IGNORED_DIRS)
        .map(|s| (*s).to_string())
        .collect();
    build_tree_with(root, md_only, &ignored)
}

/// Build the tree for `root`, skipping directories named in `ignored`.
///
/// Symlinks and hidden entries are always skipped. A directory that cannot be
/// read yields an empty child list rather than an error.
#[must_use]
pub fn build_tree_with(root: &Path, md_only: bool, ignored: &HashSet<String>) -> TreeNode {
    let name = root
        .file_name()
        .map_or_else(|| root.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %root.display(), error = %e, "Cannot read directory");
            return TreeNode::directory(name, Vec::new());
        }
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_symlink() {
            continue;
        }

        let entry_name = entry.file_name().to_string_lossy().into_owned();
        if entry_name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if file_type.is_dir() {
            if !ignored.contains(&entry_name) {
                dirs.push((entry_name, path));
            }
        } else if file_type.is_file() && (!md_only || is_markdown_file(&path)) {
            files.push((entry_name, path));
        }
    }

    dirs.sort_by_key(|(name, _)| name.to_lowercase());
    files.sort_by_key(|(name, _)| name.to_lowercase());

    let mut children = Vec::with_capacity(dirs.len() + files.len());
    children.extend(
        dirs.iter()
            .map(|(_, path)| build_tree_with(path, md_only, ignored)),
    );
    children.extend(files.iter().map(|(name, path)| TreeNode::file(name.clone(), path)));

    TreeNode::directory(name, children)
}
