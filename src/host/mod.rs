//! Host module - Capabilities topicline needs from its environment
//!
//! Provides:
//! - DocumentHost: read/write/rename documents by root-relative path
//! - BlobStore: load/save the opaque persisted state
//! - fs: filesystem-backed implementations
//! - memory: in-memory implementations for tests

pub mod fs;
#[cfg(test)]
pub mod memory;

use crate::core::error::Result;

/// Document access by root-relative path
pub trait DocumentHost {
    /// Full text of a document
    fn read(&self, path: &str) -> Result<String>;

    /// Replace the full text of a document
    fn write(&mut self, path: &str, text: &str) -> Result<()>;

    /// Whether a document exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Move a document to a new path
    fn rename(&mut self, from: &str, to: &str) -> Result<()>;
}

/// Storage for the persisted state blob shared with other application state
pub trait BlobStore {
    /// The stored blob, `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<serde_json::Value>>;

    /// Replace the stored blob
    fn save(&mut self, blob: &serde_json::Value) -> Result<()>;
}

/// Save `entries` as top-level keys of the blob, leaving every other key untouched
pub fn merge_save<B: BlobStore>(blob: &mut B, entries: Vec<(&str, serde_json::Value)>) -> Result<()> {
    let mut root = match blob.load() {
        Ok(Some(serde_json::Value::Object(map))) => map,
        Ok(Some(_)) => {
            log::warn!("persisted state is not a JSON object, replacing it");
            serde_json::Map::new()
        }
        Ok(None) => serde_json::Map::new(),
        Err(e) => {
            log::warn!("could not read persisted state before saving: {}", e);
            serde_json::Map::new()
        }
    };

    for (key, value) in entries {
        root.insert(key.to_string(), value);
    }

    blob.save(&serde_json::Value::Object(root))
}
