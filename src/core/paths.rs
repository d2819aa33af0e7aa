//! Path normalization utilities
//!
//! Document paths are stored relative to the workspace root with '/' as separator.

use std::path::{Component, Path, PathBuf};

/// Directory (under root) holding persisted topicline state
pub const DATA_DIR: &str = ".topicline";

/// Name of the persisted blob inside [`DATA_DIR`]
pub const DATA_FILE: &str = "data.json";

/// Normalize a path to use '/' as separator (for cross-platform consistency)
#[cfg(any(feature = "watch", test))]
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
#[cfg(any(feature = "watch", test))]
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Normalize a user-supplied document path into the stored form.
///
/// Absolute paths under `root` are made relative; `./` prefixes and `.`
/// components are dropped.
pub fn document_key(root: &Path, input: &Path) -> String {
    let relative = if input.is_absolute() {
        input.strip_prefix(root).unwrap_or(input)
    } else {
        input
    };

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    parts.join("/")
}

/// Resolve a stored document path to a filesystem path under root
pub fn join_normalized(base: &Path, relative: &str) -> PathBuf {
    base.join(relative.replace('/', std::path::MAIN_SEPARATOR_STR))
}

/// Get the data directory for a given root
pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

/// Whether a root-relative path points inside the data directory
#[cfg(any(feature = "watch", test))]
pub fn is_data_path(relative: &str) -> bool {
    relative == DATA_DIR || relative.starts_with(&format!("{}/", DATA_DIR))
}
