//! Protected-path policy for folder registration.

use std::path::{Path, PathBuf};

/// System locations that can never be registered.
pub const DEFAULT_DENY_LIST: &[&str] = &[
    "/",
    "/etc",
    "/root",
    "/bin",
    "/sbin",
    "/usr",
    "/var",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/lib",
    "/System",
    "/Library",
    r"C:\Windows",
];

/// Default deny list as owned paths.
#[must_use]
pub fn default_deny_list() -> Vec<PathBuf> {
    DEFAULT_DENY_LIST.iter().map(PathBuf::from).collect()
}

/// Returns `true` if `resolved` is exactly one of the denied paths.
///
/// Subdirectories of a denied path are allowed.
#[must_use]
pub fn is_path_denied(resolved: &Path, deny_list: &[PathBuf]) -> bool {
    deny_list.iter().any(|denied| denied.as_path() == resolved)
}
