//! Change coordinator - keep topics aligned with document edits
//!
//! Modify events are debounced per document and reconciled in one pass.
//! Renames and deletes are applied immediately.

#[cfg(any(feature = "watch", test))]
use std::time::{Duration, Instant};

use crate::anchors::reconcile::{reconcile_topic, Reconciled};
use crate::core::error::{Result, TopicError};
use crate::core::model::{Issue, ResultItem, Status};
use crate::core::text::Lines;
use crate::host::{BlobStore, DocumentHost};
#[cfg(any(feature = "watch", test))]
use crate::sync::debounce::Debouncer;
use crate::topics::store::TopicStore;
use crate::topics::topic::Topic;

/// Outcome for a single topic in a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    Unchanged,
    AnchorMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSync {
    /// The topic as stored after the pass
    pub topic: Topic,
    pub outcome: SyncOutcome,
}

/// Result of reconciling one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    DocumentAbsent { path: String },
    Reconciled { path: String, topics: Vec<TopicSync> },
}

impl SyncReport {
    #[cfg(test)]
    pub fn path(&self) -> &str {
        match self {
            SyncReport::DocumentAbsent { path } | SyncReport::Reconciled { path, .. } => path,
        }
    }

    pub fn count(&self, outcome: SyncOutcome) -> usize {
        match self {
            SyncReport::DocumentAbsent { .. } => 0,
            SyncReport::Reconciled { topics, .. } => {
                topics.iter().filter(|t| t.outcome == outcome).count()
            }
        }
    }

    pub fn to_result_item(&self) -> ResultItem {
        match self {
            SyncReport::DocumentAbsent { path } => ResultItem::sync(path.clone())
                .with_status(Status::Missing)
                .with_error(Issue::from(&TopicError::DocumentAbsent { path: path.clone() })),
            SyncReport::Reconciled { path, topics } => {
                let updated = self.count(SyncOutcome::Updated);
                let missing = self.count(SyncOutcome::AnchorMissing);
                let status = if missing > 0 {
                    Status::Stale
                } else if updated > 0 {
                    Status::Updated
                } else {
                    Status::Unchanged
                };

                let mut item = ResultItem::sync(path.clone())
                    .with_status(status)
                    .with_data(serde_json::json!({
                        "topics": topics.len(),
                        "updated": updated,
                        "unchanged": self.count(SyncOutcome::Unchanged),
                        "anchor_missing": missing,
                    }));
                for t in topics.iter().filter(|t| t.outcome == SyncOutcome::AnchorMissing) {
                    item = item.with_error(Issue::from(&TopicError::AnchorMissing {
                        token: t.topic.anchor_token.clone(),
                        path: path.clone(),
                    }));
                }
                item
            }
        }
    }
}

/// Derive every topic's current position from `lines` without committing
pub fn derive_positions<S: AsRef<str>>(
    lines: &[S],
    topics: &[Topic],
) -> Vec<(Topic, Result<Reconciled>)> {
    topics
        .iter()
        .map(|topic| (topic.clone(), reconcile_topic(lines, topic)))
        .collect()
}

/// Reconcile every topic of `path` against the document's current text and
/// commit the topics whose derived state changed.
pub fn reconcile_document<B, H>(
    store: &mut TopicStore<B>,
    host: &H,
    path: &str,
) -> Result<SyncReport>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    let topics = store.by_document_path(path);
    if topics.is_empty() {
        return Ok(SyncReport::Reconciled {
            path: path.to_string(),
            topics: Vec::new(),
        });
    }

    let text = match host.read(path) {
        Ok(text) => text,
        Err(TopicError::DocumentAbsent { .. }) => {
            log::info!("{}: document absent, {} topic(s) kept", path, topics.len());
            return Ok(SyncReport::DocumentAbsent {
                path: path.to_string(),
            });
        }
        Err(e) => return Err(e),
    };
    let lines = Lines::parse(&text);

    let derived = derive_positions(&lines.lines, &topics);

    let mut results = Vec::with_capacity(derived.len());
    for (topic, derived) in derived {
        match derived {
            Ok(current) if current.differs_from(&topic) => {
                store.update_position(
                    &topic.id,
                    current.start_line,
                    current.end_line,
                    &current.content,
                )?;
                log::debug!(
                    "{}: topic {} moved {}..{} -> {}..{}",
                    path,
                    topic.id,
                    topic.start_line,
                    topic.end_line,
                    current.start_line,
                    current.end_line
                );
                let updated = store.find(&topic.id).unwrap_or(topic);
                results.push(TopicSync {
                    topic: updated,
                    outcome: SyncOutcome::Updated,
                });
            }
            Ok(_) => results.push(TopicSync {
                topic,
                outcome: SyncOutcome::Unchanged,
            }),
            Err(e) => {
                log::warn!("{}", e);
                results.push(TopicSync {
                    topic,
                    outcome: SyncOutcome::AnchorMissing,
                });
            }
        }
    }

    Ok(SyncReport::Reconciled {
        path: path.to_string(),
        topics: results,
    })
}

/// Routes document events to the store
#[cfg(any(feature = "watch", test))]
#[derive(Debug)]
pub struct Coordinator {
    debouncer: Debouncer<String>,
}

#[cfg(any(feature = "watch", test))]
impl Coordinator {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
        }
    }

    /// Move every topic of `old` to `new`, carrying any pending pass along.
    ///
    /// Returns the number of topics moved.
    pub fn on_renamed<B: BlobStore>(
        &mut self,
        store: &mut TopicStore<B>,
        old: &str,
        new: &str,
    ) -> Result<usize> {
        let moved = store.rename_document(old, new)?;
        if self.debouncer.rekey(&old.to_string(), new.to_string()) {
            log::debug!("pending pass moved from {} to {}", old, new);
        }
        if moved > 0 {
            log::info!("{} -> {}: {} topic(s) followed", old, new, moved);
        }
        Ok(moved)
    }
}

#[cfg(any(feature = "watch", test))]
impl Coordinator {
    pub fn window(&self) -> Duration {
        self.debouncer.window()
    }

    /// Schedule a debounced pass for `path` if it has topics
    pub fn on_modified<B: BlobStore>(&mut self, store: &TopicStore<B>, path: &str, now: Instant) {
        if store.by_document_path(path).is_empty() {
            return;
        }
        log::trace!("{}: modified, pass scheduled", path);
        self.debouncer.schedule(path.to_string(), now);
    }

    /// Cancel any pending pass and let observers re-render orphaned topics
    pub fn on_deleted<B: BlobStore>(&mut self, store: &mut TopicStore<B>, path: &str) {
        self.debouncer.cancel(&path.to_string());
        log::info!("{}: deleted", path);
        store.notify();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.debouncer.is_empty()
    }

    /// Run every pass whose window has elapsed
    pub fn poll<B, H>(&mut self, store: &mut TopicStore<B>, host: &H, now: Instant) -> Vec<SyncReport>
    where
        B: BlobStore,
        H: DocumentHost + ?Sized,
    {
        let mut reports = Vec::new();
        for path in self.debouncer.take_due(now) {
            match reconcile_document(store, host, &path) {
                Ok(report) => reports.push(report),
                Err(e) => log::error!("{}: reconciliation failed: {}", path, e),
            }
        }
        reports
    }
}
