//! Watch mode - drive the coordinator from filesystem events
//!
//! This module is only available with the "watch" feature enabled.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time;

use crate::core::model::{ResultItem, ResultSet, Status};
use crate::core::paths::{is_data_path, make_relative};
use crate::core::render::Renderer;
use crate::host::fs::{FsBlobStore, FsWorkspace};
use crate::sync::coordinator::Coordinator;
use crate::topics::store::TopicStore;

/// A filesystem event translated to root-relative document paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Modified(String),
    Renamed { from: String, to: String },
    Deleted(String),
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = make_relative(path, root)?;
    if rel.is_empty() || is_data_path(&rel) {
        return None;
    }
    Some(rel)
}

fn relative_paths<'a>(root: &'a Path, event: &'a Event) -> impl Iterator<Item = String> + 'a {
    event.paths.iter().filter_map(move |p| relative(root, p))
}

/// Translate a notify event into document events under `root`
pub fn classify(root: &Path, event: &Event) -> Vec<DocumentEvent> {
    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            match (relative(root, &event.paths[0]), relative(root, &event.paths[1])) {
                (Some(from), Some(to)) => vec![DocumentEvent::Renamed { from, to }],
                (Some(from), None) => vec![DocumentEvent::Deleted(from)],
                (None, Some(to)) => vec![DocumentEvent::Modified(to)],
                (None, None) => Vec::new(),
            }
        }
        // Half of a rename; the paired `Both` event carries the move
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Vec::new(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Create(_) | EventKind::Modify(_) => relative_paths(root, event)
            .map(DocumentEvent::Modified)
            .collect(),
        EventKind::Remove(_) => relative_paths(root, event)
            .map(DocumentEvent::Deleted)
            .collect(),
        _ => Vec::new(),
    }
}

/// Watch `root` until Ctrl-C, reconciling documents as they change
pub fn run_watch(root: &Path, window: Duration, renderer: &Renderer) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start watch runtime")?;

    runtime.block_on(watch_loop(root, window, renderer))
}

async fn watch_loop(root: &Path, window: Duration, renderer: &Renderer) -> Result<()> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve root {}", root.display()))?;

    let mut store = TopicStore::load(FsBlobStore::for_root(&root));
    let host = FsWorkspace::new(&root);
    let mut coordinator = Coordinator::new(window);
    store.subscribe(|| {
        log::debug!("topic list changed");
        Ok(())
    });

    let (sender, mut events) = mpsc::channel::<notify::Result<Event>>(1024);
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    log::info!(
        "watching {} ({} topic(s), debounce {} ms)",
        root.display(),
        store.len(),
        coordinator.window().as_millis()
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let next_deadline = coordinator.next_deadline();

        tokio::select! {
            event = events.recv() => match event {
                Some(Ok(event)) => {
                    let mut results = ResultSet::new();
                    for doc_event in classify(&root, &event) {
                        if let Some(item) = apply(&mut coordinator, &mut store, doc_event) {
                            results.push(item);
                        }
                    }
                    renderer.print(&results);
                }
                Some(Err(err)) => log::warn!("Watcher error: {err}"),
                None => break,
            },
            () = async {
                if let Some(deadline) = next_deadline {
                    time::sleep_until(time::Instant::from_std(deadline)).await;
                }
            }, if next_deadline.is_some() => {
                let results: ResultSet = coordinator
                    .poll(&mut store, &host, Instant::now())
                    .iter()
                    .map(|report| report.to_result_item())
                    .collect();
                renderer.print(&results);
            }
            _ = &mut shutdown => {
                log::info!("stopping watch");
                break;
            }
        }
    }

    Ok(())
}

fn apply(
    coordinator: &mut Coordinator,
    store: &mut TopicStore<FsBlobStore>,
    event: DocumentEvent,
) -> Option<ResultItem> {
    match event {
        DocumentEvent::Modified(path) => {
            coordinator.on_modified(store, &path, Instant::now());
            None
        }
        DocumentEvent::Renamed { from, to } => match coordinator.on_renamed(store, &from, &to) {
            Ok(0) => None,
            Ok(moved) => Some(
                ResultItem::document(to)
                    .with_status(Status::Updated)
                    .with_data(serde_json::json!({ "renamed_from": from, "topics": moved })),
            ),
            Err(e) => {
                log::error!("{} -> {}: could not follow rename: {}", from, to, e);
                None
            }
        },
        DocumentEvent::Deleted(path) => {
            let orphaned = store.by_document_path(&path).len();
            coordinator.on_deleted(store, &path);
            (orphaned > 0).then(|| {
                ResultItem::document(path)
                    .with_status(Status::Missing)
                    .with_data(serde_json::json!({ "topics": orphaned }))
            })
        }
    }
}
