//! In-memory host used by unit tests

use std::collections::BTreeMap;
use std::io;

use crate::core::error::{Result, TopicError};
use crate::host::{BlobStore, DocumentHost};

#[derive(Debug, Default, Clone)]
pub struct MemoryWorkspace {
    pub docs: BTreeMap<String, String>,
    pub writes: usize,
}

impl MemoryWorkspace {
    pub fn with_doc(mut self, path: &str, text: &str) -> Self {
        self.docs.insert(path.to_string(), text.to_string());
        self
    }

    pub fn text(&self, path: &str) -> &str {
        self.docs.get(path).map(String::as_str).unwrap_or("")
    }

    pub fn remove(&mut self, path: &str) {
        self.docs.remove(path);
    }
}

impl DocumentHost for MemoryWorkspace {
    fn read(&self, path: &str) -> Result<String> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| TopicError::DocumentAbsent {
                path: path.to_string(),
            })
    }

    fn write(&mut self, path: &str, text: &str) -> Result<()> {
        match self.docs.get_mut(path) {
            Some(doc) => {
                *doc = text.to_string();
                self.writes += 1;
                Ok(())
            }
            None => Err(TopicError::DocumentAbsent {
                path: path.to_string(),
            }),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.docs.contains_key(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let text = self.docs.remove(from).ok_or_else(|| TopicError::DocumentAbsent {
            path: from.to_string(),
        })?;
        self.docs.insert(to.to_string(), text);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    pub blob: Option<serde_json::Value>,
    pub fail_saves: bool,
    pub saves: usize,
}

impl MemoryBlobStore {
    pub fn with_blob(blob: serde_json::Value) -> Self {
        Self {
            blob: Some(blob),
            ..Default::default()
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> Result<Option<serde_json::Value>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &serde_json::Value) -> Result<()> {
        if self.fail_saves {
            return Err(TopicError::Io(io::Error::new(
                io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.blob = Some(blob.clone());
        self.saves += 1;
        Ok(())
    }
}
