//! Sync API - reconcile on demand and follow document moves

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::model::{ResultItem, ResultSet, Status};
use crate::core::paths::document_key;
use crate::core::render::{RenderConfig, Renderer};
use crate::host::DocumentHost;
use crate::sync::coordinator::reconcile_document;
use crate::topics::api::{open, recover};

/// Reconcile one document, or every document with topics
pub fn sync(root: &Path, file: Option<&Path>) -> Result<ResultSet> {
    let (mut store, host) = open(root);

    let paths = match file {
        Some(file) => vec![document_key(root, file)],
        None => store.document_paths(),
    };

    let mut result_set = ResultSet::new();
    for path in paths {
        let item = match reconcile_document(&mut store, &host, &path) {
            Ok(report) => report.to_result_item(),
            Err(e) => recover(e)?.with_path(path),
        };
        result_set.push(item);
    }
    Ok(result_set)
}

/// Move a document on disk and carry its topics along
pub fn mv(root: &Path, old: &Path, new: &Path) -> Result<ResultSet> {
    let from = document_key(root, old);
    let to = document_key(root, new);
    let (mut store, mut host) = open(root);

    if let Err(e) = host.rename(&from, &to) {
        return Ok(std::iter::once(recover(e)?.with_path(from)).collect());
    }

    let moved = store
        .rename_document(&from, &to)
        .with_context(|| format!("Moved {} to {} but failed to update topics", from, to))?;

    let item = ResultItem::document(to)
        .with_status(Status::Updated)
        .with_data(serde_json::json!({ "renamed_from": from, "topics": moved }));
    Ok(std::iter::once(item).collect())
}

/// Debounce window from the persisted settings unless overridden
#[cfg(any(feature = "watch", test))]
pub fn window_for(root: &Path, override_ms: Option<u64>) -> std::time::Duration {
    use crate::host::fs::FsBlobStore;
    use crate::topics::settings::Settings;

    let ms = override_ms.unwrap_or_else(|| Settings::load(&FsBlobStore::for_root(root)).debounce_ms);
    std::time::Duration::from_millis(ms)
}

pub fn run_sync(root: &Path, file: Option<&Path>, config: RenderConfig) -> Result<()> {
    let result_set = sync(root, file)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_mv(root: &Path, old: &Path, new: &Path, config: RenderConfig) -> Result<()> {
    let result_set = mv(root, old, new)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::api::register;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_sync_after_edit() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "one\ntwo\n").unwrap();
        register(temp.path(), Path::new("a.md"), "2").unwrap();

        let text = fs::read_to_string(temp.path().join("a.md")).unwrap();
        fs::write(temp.path().join("a.md"), format!("zero\n{}", text)).unwrap();

        let result = sync(temp.path(), None).unwrap();
        assert_eq!(result.items[0].status, Some(Status::Updated));

        let again = sync(temp.path(), Some(Path::new("a.md"))).unwrap();
        assert_eq!(again.items[0].status, Some(Status::Unchanged));
    }

    #[test]
    fn test_mv_follows_topics() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "one\ntwo\n").unwrap();
        register(temp.path(), Path::new("a.md"), "1").unwrap();

        let result = mv(temp.path(), Path::new("a.md"), Path::new("docs/b.md")).unwrap();
        assert_eq!(result.items[0].path.as_deref(), Some("docs/b.md"));
        assert!(temp.path().join("docs/b.md").is_file());

        let (store, _) = open(temp.path());
        assert_eq!(store.by_document_path("docs/b.md").len(), 1);
    }

    #[test]
    fn test_window_override() {
        let temp = tempdir().unwrap();
        assert_eq!(window_for(temp.path(), None), Duration::from_millis(300));
        assert_eq!(window_for(temp.path(), Some(10)), Duration::from_millis(10));
    }
}
