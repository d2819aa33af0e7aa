//! Topic API - command entry points for topic management

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::error::TopicError;
use crate::core::model::{Issue, ResultItem, ResultSet, Status};
use crate::core::paths::document_key;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{parse_line_range, parse_position};
use crate::host::fs::{FsBlobStore, FsWorkspace};
use crate::topics::actions::{self, Toggled};
use crate::topics::settings::Settings;
use crate::topics::store::TopicStore;
use crate::topics::topic::Topic;

/// Store and document host for a workspace root
pub fn open(root: &Path) -> (TopicStore<FsBlobStore>, FsWorkspace) {
    (
        TopicStore::load(FsBlobStore::for_root(root)),
        FsWorkspace::new(root),
    )
}

/// Turn a recoverable error into an error item; transport errors propagate
pub fn recover(err: TopicError) -> Result<ResultItem> {
    match err {
        TopicError::Io(_) | TopicError::Json(_) => Err(err.into()),
        other => {
            log::debug!("{}", other);
            Ok(ResultItem::error(Issue::from(&other)))
        }
    }
}

fn removed_items(topics: &[Topic]) -> ResultSet {
    topics
        .iter()
        .map(|t| t.to_result_item(None).with_status(Status::Removed))
        .collect()
}

fn listed_items(root: &Path) -> Result<ResultSet> {
    let (store, host) = open(root);
    match actions::list(&store, &host) {
        Ok(listed) => Ok(listed.iter().map(|l| l.to_result_item()).collect()),
        Err(e) => Ok(std::iter::once(recover(e)?).collect()),
    }
}

/// Register a line range of a document as a topic
pub fn register(root: &Path, file: &Path, lines: &str) -> Result<ResultSet> {
    let (start, end) = parse_line_range(lines)?;
    let path = document_key(root, file);
    let (mut store, mut host) = open(root);

    let item = match actions::register(&mut store, &mut host, &path, start, end) {
        Ok(topic) => {
            let index = store.index_of(&topic.id);
            topic.to_result_item(index).with_status(Status::Ok)
        }
        Err(e) => recover(e)?.with_path(path),
    };
    Ok(std::iter::once(item).collect())
}

/// Remove the topics overlapping a line range of a document
pub fn unregister(root: &Path, file: &Path, lines: &str) -> Result<ResultSet> {
    let (start, end) = parse_line_range(lines)?;
    let path = document_key(root, file);
    let (mut store, mut host) = open(root);

    match actions::unregister(&mut store, &mut host, &path, start, end) {
        Ok(removed) => Ok(removed_items(&removed)),
        Err(e) => Ok(std::iter::once(recover(e)?.with_path(path)).collect()),
    }
}

pub fn toggle(root: &Path, file: &Path, lines: &str) -> Result<ResultSet> {
    let (start, end) = parse_line_range(lines)?;
    let path = document_key(root, file);
    let (mut store, mut host) = open(root);

    match actions::toggle(&mut store, &mut host, &path, start, end) {
        Ok(Toggled::Registered(topic)) => {
            let index = store.index_of(&topic.id);
            Ok(std::iter::once(topic.to_result_item(index).with_status(Status::Ok)).collect())
        }
        Ok(Toggled::Unregistered(removed)) => Ok(removed_items(&removed)),
        Err(e) => Ok(std::iter::once(recover(e)?.with_path(path)).collect()),
    }
}

pub fn jump(root: &Path, position: usize) -> Result<ResultSet> {
    let index = parse_position(position)?;
    let (store, host) = open(root);

    let item = match actions::jump(&store, &host, index) {
        Ok(listed) => {
            let line = listed.line() + 1;
            listed.to_result_item().with_data(serde_json::json!({
                "id": listed.topic.id,
                "index": position,
                "line": line,
            }))
        }
        Err(e) => recover(e)?,
    };
    Ok(std::iter::once(item).collect())
}

pub fn reorder(root: &Path, from: usize, to: usize) -> Result<ResultSet> {
    let (from, to) = (parse_position(from)?, parse_position(to)?);
    let (mut store, _) = open(root);

    if let Err(e) = actions::reorder(&mut store, from, to) {
        return Ok(std::iter::once(recover(e)?).collect());
    }
    listed_items(root)
}

pub fn clear(root: &Path) -> Result<ResultSet> {
    let (mut store, mut host) = open(root);
    match actions::clear(&mut store, &mut host) {
        Ok(removed) => Ok(removed_items(&removed)),
        Err(e) => Ok(std::iter::once(recover(e)?).collect()),
    }
}

fn settings_items(settings: &Settings) -> ResultSet {
    settings
        .entries()
        .into_iter()
        .map(|(name, value)| ResultItem::setting(name, value))
        .collect()
}

pub fn config_show(root: &Path) -> ResultSet {
    settings_items(&Settings::load(&FsBlobStore::for_root(root)))
}

pub fn config_set(root: &Path, name: &str, value: &str) -> Result<ResultSet> {
    let mut blob = FsBlobStore::for_root(root);
    let mut settings = Settings::load(&blob);

    if let Err(e) = settings.set(name, value) {
        return Ok(std::iter::once(recover(e)?).collect());
    }
    settings
        .save(&mut blob)
        .context("Failed to save settings")?;
    Ok(settings_items(&settings))
}

/// Print all topics in order with their status
pub fn run_list(root: &Path, config: RenderConfig) -> Result<()> {
    let result_set = listed_items(root)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_register(root: &Path, file: &Path, lines: &str, config: RenderConfig) -> Result<()> {
    let result_set = register(root, file, lines)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_unregister(root: &Path, file: &Path, lines: &str, config: RenderConfig) -> Result<()> {
    let result_set = unregister(root, file, lines)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_toggle(root: &Path, file: &Path, lines: &str, config: RenderConfig) -> Result<()> {
    let result_set = toggle(root, file, lines)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_jump(root: &Path, position: usize, config: RenderConfig) -> Result<()> {
    let result_set = jump(root, position)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_reorder(root: &Path, from: usize, to: usize, config: RenderConfig) -> Result<()> {
    let result_set = reorder(root, from, to)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_clear(root: &Path, config: RenderConfig) -> Result<()> {
    let result_set = clear(root)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

pub fn run_config_show(root: &Path, config: RenderConfig) -> Result<()> {
    Renderer::with_config(config).print(&config_show(root));
    Ok(())
}

pub fn run_config_set(root: &Path, name: &str, value: &str, config: RenderConfig) -> Result<()> {
    let result_set = config_set(root, name, value)?;
    Renderer::with_config(config).print(&result_set);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Kind;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_register_and_list() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "one\ntwo\nthree\n").unwrap();

        let registered = register(temp.path(), Path::new("a.md"), "2:3").unwrap();
        let item = &registered.items[0];
        assert_eq!(item.kind, Kind::Topic);
        assert_eq!(item.excerpt.as_deref(), Some("two\nthree"));

        let listed = listed_items(temp.path()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.items[0].status, Some(Status::Ok));
    }

    #[test]
    fn test_register_missing_file_is_error_item() {
        let temp = tempdir().unwrap();
        let result = register(temp.path(), Path::new("nope.md"), "1").unwrap();
        let item = &result.items[0];
        assert_eq!(item.kind, Kind::Error);
        assert_eq!(item.errors[0].code, "DOCUMENT_ABSENT");
        assert_eq!(item.path.as_deref(), Some("nope.md"));
    }

    #[test]
    fn test_bad_line_range_is_argument_error() {
        let temp = tempdir().unwrap();
        assert!(register(temp.path(), Path::new("a.md"), "0:2").is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let temp = tempdir().unwrap();
        assert_eq!(config_show(temp.path()).items[0].data, Some(serde_json::json!(300)));

        config_set(temp.path(), "debounce-ms", "50").unwrap();
        assert_eq!(config_show(temp.path()).items[0].data, Some(serde_json::json!(50)));

        let bad = config_set(temp.path(), "nope", "1").unwrap();
        assert_eq!(bad.items[0].errors[0].code, "INVALID_SETTING");
    }
}
