//! User-facing topic actions
//!
//! Actions combine the store with document access: registering writes an
//! anchor into the document, unregistering strips it again.

use std::collections::BTreeMap;

use crate::anchors::codec::{attach, detach, detect, locate};
use crate::anchors::reconcile::{range_content, reconcile_topic, Reconciled};
use crate::core::error::{Result, TopicError};
use crate::core::model::{Issue, ResultItem, Status};
use crate::core::text::Lines;
use crate::host::{BlobStore, DocumentHost};
use crate::sync::coordinator::reconcile_document;
use crate::topics::store::{AddOutcome, NewTopic, TopicStore, MAX_TOPICS};
use crate::topics::topic::Topic;

/// What a toggle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Registered(Topic),
    Unregistered(Vec<Topic>),
}

/// A topic as it currently appears in its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedTopic {
    /// 0-based slot
    pub index: usize,
    pub topic: Topic,
    pub status: Status,
    /// Position derived from the current text, when the anchor was found
    pub current: Option<Reconciled>,
}

impl ListedTopic {
    /// Current start line, falling back to the last-known one
    pub fn line(&self) -> usize {
        self.current
            .as_ref()
            .map(|c| c.start_line)
            .unwrap_or(self.topic.start_line)
    }

    pub fn to_result_item(&self) -> ResultItem {
        let mut shown = self.topic.clone();
        if let Some(current) = &self.current {
            shown.start_line = current.start_line;
            shown.end_line = current.end_line;
            shown.content = current.content.clone();
        }

        let item = shown.to_result_item(Some(self.index)).with_status(self.status);
        match self.status {
            Status::Missing => item.with_error(Issue::from(&TopicError::DocumentAbsent {
                path: self.topic.document_path.clone(),
            })),
            Status::Stale => item.with_error(Issue::from(&TopicError::AnchorMissing {
                token: self.topic.anchor_token.clone(),
                path: self.topic.document_path.clone(),
            })),
            _ => item,
        }
    }
}

/// Register `start..=end` (0-based) of `path` as a topic.
///
/// The anchor is written into the document before the topic is stored; if
/// storing fails the document is restored.
pub fn register<B, H>(
    store: &mut TopicStore<B>,
    host: &mut H,
    path: &str,
    start: usize,
    end: usize,
) -> Result<Topic>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    if store.is_full() {
        return Err(TopicError::CapacityExceeded { max: MAX_TOPICS });
    }

    let original = host.read(path)?;
    let mut lines = Lines::parse(&original);
    if start > end || end >= lines.len() {
        return Err(TopicError::InvalidRange {
            path: path.to_string(),
            start: start + 1,
            end: end + 1,
            len: lines.len(),
        });
    }

    for line in start..=end {
        let live = detect(&lines.lines[line])
            .and_then(|token| store.find_by_anchor(token))
            .filter(|topic| topic.document_path == path);
        if let Some(existing) = live {
            return Err(TopicError::AlreadyRegistered {
                path: path.to_string(),
                line: line + 1,
                id: existing.id,
            });
        }
    }

    let token = store.generate_anchor_token();
    let content = range_content(&lines.lines, start, end);
    lines.lines[start] = attach(&lines.lines[start], &token);
    host.write(path, &lines.to_text())?;

    let added = store.add(NewTopic {
        document_path: path.to_string(),
        start_line: start,
        end_line: end,
        content,
        anchor_token: token,
    });

    match added {
        Ok(AddOutcome::Added(topic)) => {
            log::info!("{}: registered lines {}-{}", path, start + 1, end + 1);
            Ok(topic)
        }
        Ok(AddOutcome::CapacityExceeded) => {
            restore(host, path, &original);
            Err(TopicError::CapacityExceeded { max: MAX_TOPICS })
        }
        Err(e) => {
            restore(host, path, &original);
            Err(e)
        }
    }
}

fn restore<H: DocumentHost + ?Sized>(host: &mut H, path: &str, original: &str) {
    if let Err(e) = host.write(path, original) {
        log::error!("{}: could not remove anchor after failed registration: {}", path, e);
    }
}

/// Remove every topic of `path` whose range overlaps `start..=end` (0-based)
/// and strip their anchors from the document.
///
/// Positions are reconciled first so the range refers to the current text.
pub fn unregister<B, H>(
    store: &mut TopicStore<B>,
    host: &mut H,
    path: &str,
    start: usize,
    end: usize,
) -> Result<Vec<Topic>>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    reconcile_document(store, &*host, path)?;

    let overlapping: Vec<Topic> = store
        .by_document_path(path)
        .into_iter()
        .filter(|t| t.overlaps(start, end))
        .collect();

    for topic in &overlapping {
        store.remove(&topic.id)?;
    }

    if host.exists(path) {
        strip_anchors(host, path, &overlapping)?;
    }

    log::info!("{}: {} topic(s) removed", path, overlapping.len());
    Ok(overlapping)
}

/// Unregister when any topic overlaps the range, register otherwise
pub fn toggle<B, H>(
    store: &mut TopicStore<B>,
    host: &mut H,
    path: &str,
    start: usize,
    end: usize,
) -> Result<Toggled>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    reconcile_document(store, &*host, path)?;

    let overlaps = store
        .by_document_path(path)
        .iter()
        .any(|t| t.overlaps(start, end));

    if overlaps {
        unregister(store, host, path, start, end).map(Toggled::Unregistered)
    } else {
        register(store, host, path, start, end).map(Toggled::Registered)
    }
}

/// Every topic in order, with its status against the current documents.
///
/// Nothing is committed.
pub fn list<B, H>(store: &TopicStore<B>, host: &H) -> Result<Vec<ListedTopic>>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    let topics = store.all();
    let mut documents: BTreeMap<String, Option<Lines>> = BTreeMap::new();

    for path in store.document_paths() {
        let lines = match host.read(&path) {
            Ok(text) => Some(Lines::parse(&text)),
            Err(TopicError::DocumentAbsent { .. }) => None,
            Err(e) => return Err(e),
        };
        documents.insert(path, lines);
    }

    let listed = topics
        .into_iter()
        .enumerate()
        .map(|(index, topic)| {
            let (status, current) = match documents.get(&topic.document_path) {
                Some(Some(lines)) => match reconcile_topic(&lines.lines, &topic) {
                    Ok(current) => (Status::Ok, Some(current)),
                    Err(_) => (Status::Stale, None),
                },
                _ => (Status::Missing, None),
            };
            ListedTopic {
                index,
                topic,
                status,
                current,
            }
        })
        .collect();

    Ok(listed)
}

/// The topic at 0-based `index`, with its current location
pub fn jump<B, H>(store: &TopicStore<B>, host: &H, index: usize) -> Result<ListedTopic>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    let len = store.len();
    list(store, host)?
        .into_iter()
        .nth(index)
        .ok_or(TopicError::NotFound {
            position: index + 1,
            len,
        })
}

/// Move the topic at 0-based `from` to `to`; both must name existing slots
pub fn reorder<B: BlobStore>(store: &mut TopicStore<B>, from: usize, to: usize) -> Result<()> {
    let len = store.len();
    for position in [from, to] {
        if position >= len {
            return Err(TopicError::NotFound {
                position: position + 1,
                len,
            });
        }
    }
    store.reorder(from, to)
}

/// Remove all topics and strip their anchors from every existing document
pub fn clear<B, H>(store: &mut TopicStore<B>, host: &mut H) -> Result<Vec<Topic>>
where
    B: BlobStore,
    H: DocumentHost + ?Sized,
{
    let removed = store.remove_all()?;

    let mut by_path: BTreeMap<&str, Vec<Topic>> = BTreeMap::new();
    for topic in &removed {
        by_path
            .entry(topic.document_path.as_str())
            .or_default()
            .push(topic.clone());
    }

    for (path, topics) in by_path {
        if !host.exists(path) {
            continue;
        }
        if let Err(e) = strip_anchors(host, path, &topics) {
            log::warn!("{}: could not strip anchors: {}", path, e);
        }
    }

    Ok(removed)
}

/// Remove the anchors of `topics` from the document at `path`
fn strip_anchors<H: DocumentHost + ?Sized>(host: &mut H, path: &str, topics: &[Topic]) -> Result<()> {
    if topics.is_empty() {
        return Ok(());
    }

    let mut lines = Lines::parse(&host.read(path)?);
    let mut changed = false;
    for topic in topics {
        if let Some(index) = locate(&lines.lines, &topic.anchor_token) {
            lines.lines[index] = detach(&lines.lines[index]);
            changed = true;
        }
    }

    if changed {
        host.write(path, &lines.to_text())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryBlobStore, MemoryWorkspace};

    fn setup(text: &str) -> (TopicStore<MemoryBlobStore>, MemoryWorkspace) {
        (
            TopicStore::load(MemoryBlobStore::default()),
            MemoryWorkspace::default().with_doc("a.md", text),
        )
    }

    #[test]
    fn test_register_embeds_anchor() {
        let (mut store, mut ws) = setup("# Title\n- first\n- second\n");
        let topic = register(&mut store, &mut ws, "a.md", 1, 2).unwrap();

        assert_eq!(topic.content, "- first\n- second");
        assert_eq!(topic.line_span, 2);
        let lines: Vec<&str> = ws.text("a.md").split('\n').collect();
        assert_eq!(lines[1], format!("- first ^{}", topic.anchor_token));
        assert_eq!(lines[2], "- second");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_register_keeps_crlf() {
        let (mut store, mut ws) = setup("a\r\nb\r\n");
        let topic = register(&mut store, &mut ws, "a.md", 0, 0).unwrap();
        assert_eq!(ws.text("a.md"), format!("a ^{}\r\nb\r\n", topic.anchor_token));
    }

    #[test]
    fn test_register_keeps_mixed_line_endings() {
        let (mut store, mut ws) = setup("a\nb\r\nc\n");
        let topic = register(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        assert_eq!(ws.text("a.md"), format!("a\nb ^{}\r\nc\n", topic.anchor_token));

        unregister(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        assert_eq!(ws.text("a.md"), "a\nb\r\nc\n");
    }

    #[test]
    fn test_register_over_pasted_anchor_from_other_document() {
        let (mut store, mut ws) = setup("one\ntwo");
        let original = register(&mut store, &mut ws, "a.md", 0, 0).unwrap();
        let pasted = format!("copied ^{}\nmore", original.anchor_token);
        ws.docs.insert("b.md".to_string(), pasted);

        let topic = register(&mut store, &mut ws, "b.md", 0, 0).unwrap();
        assert_ne!(topic.anchor_token, original.anchor_token);
        assert_eq!(topic.content, "copied");
        assert_eq!(ws.text("b.md"), format!("copied ^{}\nmore", topic.anchor_token));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_register_range_covering_live_anchor_is_rejected() {
        let (mut store, mut ws) = setup("one\ntwo\nthree");
        let inner = register(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        let writes = ws.writes;

        let err = register(&mut store, &mut ws, "a.md", 0, 2).unwrap_err();
        assert!(matches!(err, TopicError::AlreadyRegistered { line: 2, ref id, .. } if *id == inner.id));
        assert_eq!(ws.writes, writes);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_rejects_bad_range() {
        let (mut store, mut ws) = setup("one\ntwo");
        assert!(matches!(
            register(&mut store, &mut ws, "a.md", 1, 5),
            Err(TopicError::InvalidRange { .. })
        ));
        assert_eq!(ws.writes, 0);
    }

    #[test]
    fn test_register_missing_document() {
        let (mut store, mut ws) = setup("x");
        assert!(matches!(
            register(&mut store, &mut ws, "nope.md", 0, 0),
            Err(TopicError::DocumentAbsent { .. })
        ));
    }

    #[test]
    fn test_register_twice_on_same_line_is_rejected() {
        let (mut store, mut ws) = setup("one\ntwo");
        register(&mut store, &mut ws, "a.md", 0, 0).unwrap();
        assert!(matches!(
            register(&mut store, &mut ws, "a.md", 0, 1),
            Err(TopicError::AlreadyRegistered { line: 1, .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_at_capacity_leaves_document_alone() {
        let text: String = (0..25).map(|i| format!("line {}\n", i)).collect();
        let (mut store, mut ws) = setup(&text);
        for i in 0..MAX_TOPICS {
            register(&mut store, &mut ws, "a.md", i, i).unwrap();
        }
        let before = ws.text("a.md").to_string();

        assert!(matches!(
            register(&mut store, &mut ws, "a.md", 22, 22),
            Err(TopicError::CapacityExceeded { max: 20 })
        ));
        assert_eq!(ws.text("a.md"), before);
        assert_eq!(store.len(), MAX_TOPICS);
    }

    #[test]
    fn test_register_failed_save_restores_document() {
        let (mut store, mut ws) = setup("one\ntwo");
        store.blob_mut().fail_saves = true;

        assert!(register(&mut store, &mut ws, "a.md", 0, 0).is_err());
        assert_eq!(ws.text("a.md"), "one\ntwo");
        assert!(store.is_empty());
    }

    #[test]
    fn test_unregister_strips_overlapping() {
        let (mut store, mut ws) = setup("a\nb\nc\nd\ne");
        let first = register(&mut store, &mut ws, "a.md", 0, 1).unwrap();
        let kept = register(&mut store, &mut ws, "a.md", 3, 3).unwrap();

        let removed = unregister(&mut store, &mut ws, "a.md", 1, 2).unwrap();
        assert_eq!(removed, vec![first]);
        assert_eq!(store.all(), vec![kept.clone()]);
        assert_eq!(ws.text("a.md"), format!("a\nb\nc\nd ^{}\ne", kept.anchor_token));
    }

    #[test]
    fn test_unregister_uses_current_positions() {
        let (mut store, mut ws) = setup("a\nb\nc");
        let topic = register(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        let shifted = format!("new\n{}", ws.text("a.md"));
        ws.docs.insert("a.md".to_string(), shifted);

        assert!(unregister(&mut store, &mut ws, "a.md", 1, 1).unwrap().is_empty());
        let removed = unregister(&mut store, &mut ws, "a.md", 2, 2).unwrap();
        assert_eq!(removed[0].id, topic.id);
        assert_eq!(ws.text("a.md"), "new\na\nb\nc");
    }

    #[test]
    fn test_toggle_round_trip() {
        let (mut store, mut ws) = setup("a\nb\nc");
        let registered = toggle(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        assert!(matches!(registered, Toggled::Registered(_)));

        let removed = toggle(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        assert!(matches!(removed, Toggled::Unregistered(ref t) if t.len() == 1));
        assert_eq!(ws.text("a.md"), "a\nb\nc");
    }

    #[test]
    fn test_list_reports_status() {
        let mut ws = MemoryWorkspace::default()
            .with_doc("a.md", "a\nb")
            .with_doc("b.md", "x\ny")
            .with_doc("c.md", "p\nq");
        let mut store = TopicStore::load(MemoryBlobStore::default());
        register(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        register(&mut store, &mut ws, "b.md", 0, 0).unwrap();
        register(&mut store, &mut ws, "c.md", 0, 1).unwrap();

        let shifted = format!("top\n{}", ws.text("a.md"));
        ws.docs.insert("a.md".to_string(), shifted);
        ws.docs.insert("b.md".to_string(), "x\ny".to_string());
        ws.remove("c.md");

        let listed = list(&store, &ws).unwrap();
        let statuses: Vec<Status> = listed.iter().map(|l| l.status).collect();
        assert_eq!(statuses, vec![Status::Ok, Status::Stale, Status::Missing]);
        assert_eq!(listed[0].line(), 2);
        assert_eq!(listed[1].line(), 0);

        assert_eq!(store.by_index(0).unwrap().start_line, 1);
    }

    #[test]
    fn test_jump() {
        let (mut store, mut ws) = setup("a\nb\nc");
        register(&mut store, &mut ws, "a.md", 2, 2).unwrap();

        assert_eq!(jump(&store, &ws, 0).unwrap().line(), 2);
        assert!(matches!(
            jump(&store, &ws, 3),
            Err(TopicError::NotFound { position: 4, len: 1 })
        ));
    }

    #[test]
    fn test_reorder_validates_positions() {
        let (mut store, mut ws) = setup("a\nb\nc");
        let a = register(&mut store, &mut ws, "a.md", 0, 0).unwrap();
        let b = register(&mut store, &mut ws, "a.md", 1, 1).unwrap();

        reorder(&mut store, 0, 1).unwrap();
        assert_eq!(store.all(), vec![b, a]);
        assert!(matches!(
            reorder(&mut store, 0, 2),
            Err(TopicError::NotFound { position: 3, .. })
        ));
    }

    #[test]
    fn test_clear_strips_every_document() {
        let mut ws = MemoryWorkspace::default()
            .with_doc("a.md", "a\nb")
            .with_doc("b.md", "x ^block1\ny");
        let mut store = TopicStore::load(MemoryBlobStore::default());
        register(&mut store, &mut ws, "a.md", 0, 0).unwrap();
        register(&mut store, &mut ws, "a.md", 1, 1).unwrap();
        register(&mut store, &mut ws, "b.md", 1, 1).unwrap();

        let removed = clear(&mut store, &mut ws).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(store.is_empty());
        assert_eq!(ws.text("a.md"), "a\nb");
        assert_eq!(ws.text("b.md"), "x ^block1\ny");
    }
}
