//! Folder registration, path policy, tree listings and file access.

mod content;
mod error;
mod security;
mod service;
mod tree;

pub use content::read_markdown;
pub use error::FolderError;
pub use security::{default_deny_list, is_path_denied, DEFAULT_DENY_LIST};
pub use service::{FolderService, FolderTree, MAX_NAME_LEN};
pub use tree::{build_tree, build_tree_with, NodeKind, TreeNode, TREE_EXTRA_IGNORED_DIRS};
