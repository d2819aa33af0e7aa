//! Filesystem host - documents under a root directory, state in .topicline/

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TopicError};
use crate::core::paths::{data_dir, join_normalized, DATA_FILE};
use crate::host::{BlobStore, DocumentHost};

/// Documents stored as files under `root`
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        join_normalized(&self.root, path)
    }
}

fn absent_or_io(err: std::io::Error, path: &str) -> TopicError {
    if err.kind() == ErrorKind::NotFound {
        TopicError::DocumentAbsent {
            path: path.to_string(),
        }
    } else {
        TopicError::Io(err)
    }
}

impl DocumentHost for FsWorkspace {
    fn read(&self, path: &str) -> Result<String> {
        fs::read_to_string(self.resolve(path)).map_err(|e| absent_or_io(e, path))
    }

    fn write(&mut self, path: &str, text: &str) -> Result<()> {
        let target = self.resolve(path);
        if !target.is_file() {
            return Err(TopicError::DocumentAbsent {
                path: path.to_string(),
            });
        }
        fs::write(&target, text)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from);
        if !source.is_file() {
            return Err(TopicError::DocumentAbsent {
                path: from.to_string(),
            });
        }
        let target = self.resolve(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(source, target)?;
        Ok(())
    }
}

/// Persisted blob at `<root>/.topicline/data.json`
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    path: PathBuf,
}

impl FsBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Blob store at the default location for a workspace root
    pub fn for_root(root: &Path) -> Self {
        Self::new(data_dir(root).join(DATA_FILE))
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStore for FsBlobStore {
    fn load(&self) -> Result<Option<serde_json::Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write to a sibling temp file, then rename over the target
    fn save(&mut self, blob: &serde_json::Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(blob)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_read_write() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "hello\n").unwrap();

        let mut ws = FsWorkspace::new(temp.path());
        assert!(ws.exists("a.md"));
        assert_eq!(ws.read("a.md").unwrap(), "hello\n");

        ws.write("a.md", "bye\n").unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("a.md")).unwrap(), "bye\n");
    }

    #[test]
    fn test_workspace_missing_document() {
        let temp = tempdir().unwrap();
        let mut ws = FsWorkspace::new(temp.path());
        assert!(!ws.exists("nope.md"));
        assert!(matches!(
            ws.read("nope.md"),
            Err(TopicError::DocumentAbsent { .. })
        ));
        assert!(matches!(
            ws.write("nope.md", "x"),
            Err(TopicError::DocumentAbsent { .. })
        ));
    }

    #[test]
    fn test_workspace_rename_creates_parent() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "x").unwrap();

        let mut ws = FsWorkspace::new(temp.path());
        ws.rename("a.md", "archive/b.md").unwrap();

        assert!(!ws.exists("a.md"));
        assert!(ws.exists("archive/b.md"));
    }

    #[test]
    fn test_blob_store_missing_is_none() {
        let temp = tempdir().unwrap();
        let store = FsBlobStore::for_root(temp.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_blob_store_round_trip() {
        let temp = tempdir().unwrap();
        let mut store = FsBlobStore::for_root(temp.path());
        store.save(&json!({"version": 1, "topics": []})).unwrap();

        assert!(store.path().ends_with(".topicline/data.json"));
        assert_eq!(store.load().unwrap(), Some(json!({"version": 1, "topics": []})));
    }

    #[test]
    fn test_blob_store_invalid_json_is_error() {
        let temp = tempdir().unwrap();
        let store = FsBlobStore::for_root(temp.path());
        fs::create_dir_all(data_dir(temp.path())).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(TopicError::Json(_))));
    }
}
