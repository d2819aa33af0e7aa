//! Topic store - the ordered, bounded topic collection
//!
//! The store is the only place the collection is mutated. Every mutation is
//! saved before it is observable: if the save fails the in-memory collection is
//! rolled back and the error returned. Observers run after a successful save.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::anchors::codec::{generate_unique_anchor, is_anchor_token};
use crate::core::error::{Result, TopicError};
use crate::host::{merge_save, BlobStore};
use crate::topics::topic::{Topic, TopicData, SCHEMA_VERSION};

/// Maximum number of topics
pub const MAX_TOPICS: usize = 20;

/// Upper bound for a loaded `lineSpan`
const MAX_LINE_SPAN: usize = 1 << 20;

/// Handle returned by [`TopicStore::subscribe`]
pub type SubscriptionId = u64;

type Observer = Box<dyn FnMut() -> anyhow::Result<()>>;

/// Input for [`TopicStore::add`]
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub document_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub anchor_token: String,
}

/// Result of [`TopicStore::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Topic),
    CapacityExceeded,
}

pub struct TopicStore<B: BlobStore> {
    blob: B,
    topics: Vec<Topic>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
}

impl<B: BlobStore> TopicStore<B> {
    /// Load the collection from `blob`.
    ///
    /// Missing or malformed state yields an empty collection; this never fails.
    pub fn load(blob: B) -> Self {
        let topics = match blob.load() {
            Ok(Some(value)) => match parse_topic_data(value) {
                Ok(data) => sanitize(data.topics),
                Err(e) => {
                    log::warn!("{}; starting with an empty topic list", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!(
                    "{}; starting with an empty topic list",
                    TopicError::MalformedPersistedState(e.to_string())
                );
                Vec::new()
            }
        };

        log::debug!("loaded {} topic(s)", topics.len());

        Self {
            blob,
            topics,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Snapshot of all topics in order
    pub fn all(&self) -> Vec<Topic> {
        self.topics.clone()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.topics.len() >= MAX_TOPICS
    }

    /// Topic at a 0-based slot
    pub fn by_index(&self, index: usize) -> Option<Topic> {
        self.topics.get(index).cloned()
    }

    /// Topics of one document, in collection order
    pub fn by_document_path(&self, path: &str) -> Vec<Topic> {
        self.topics
            .iter()
            .filter(|t| t.document_path == path)
            .cloned()
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<Topic> {
        self.topics.iter().find(|t| t.id == id).cloned()
    }

    pub fn find_by_anchor(&self, token: &str) -> Option<Topic> {
        self.topics.iter().find(|t| t.anchor_token == token).cloned()
    }

    /// 0-based slot of a topic
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.topics.iter().position(|t| t.id == id)
    }

    /// Distinct document paths, in order of first appearance
    pub fn document_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.topics
            .iter()
            .filter(|t| seen.insert(t.document_path.as_str()))
            .map(|t| t.document_path.clone())
            .collect()
    }

    /// A token not used by any live topic
    pub fn generate_anchor_token(&self) -> String {
        let existing: HashSet<&str> = self.topics.iter().map(|t| t.anchor_token.as_str()).collect();
        generate_unique_anchor(&existing)
    }

    /// Append a topic. The caller embeds `anchor_token` in the document.
    pub fn add(&mut self, new: NewTopic) -> Result<AddOutcome> {
        if self.is_full() {
            log::info!("rejecting topic for {}: store is full", new.document_path);
            return Ok(AddOutcome::CapacityExceeded);
        }

        if let Some(existing) = self.topics.iter().find(|t| t.anchor_token == new.anchor_token) {
            return Err(TopicError::AlreadyRegistered {
                path: existing.document_path.clone(),
                line: existing.start_line,
                id: existing.id.clone(),
            });
        }

        let topic = Topic::new(
            new.document_path,
            new.start_line,
            new.end_line.max(new.start_line),
            new.content,
            new.anchor_token,
        );

        let added = topic.clone();
        self.commit(move |topics| {
            topics.push(topic);
            true
        })?;

        log::debug!("added topic {} ({})", added.id, added.anchor_token);
        Ok(AddOutcome::Added(added))
    }

    /// Remove a topic; absent ids are ignored
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.commit(|topics| match topics.iter().position(|t| t.id == id) {
            Some(index) => {
                topics.remove(index);
                true
            }
            None => false,
        })?;
        Ok(())
    }

    /// Empty the collection, returning what was removed
    pub fn remove_all(&mut self) -> Result<Vec<Topic>> {
        let mut removed = Vec::new();
        self.commit(|topics| {
            removed = std::mem::take(topics);
            !removed.is_empty()
        })?;
        Ok(removed)
    }

    /// Move the topic at `from` so that it ends up at `to`.
    ///
    /// `to` is counted after removal: `[A,B,C,D]` with `(0, 2)` gives `[B,C,A,D]`.
    /// Out-of-range indices are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.commit(|topics| {
            if from >= topics.len() || to >= topics.len() || from == to {
                return false;
            }
            let moved = topics.remove(from);
            topics.insert(to, moved);
            true
        })?;
        Ok(())
    }

    /// Store a reconciled position; absent ids are ignored
    pub fn update_position(
        &mut self,
        id: &str,
        start_line: usize,
        end_line: usize,
        content: &str,
    ) -> Result<()> {
        self.commit(|topics| match topics.iter_mut().find(|t| t.id == id) {
            Some(topic)
                if topic.start_line != start_line
                    || topic.end_line != end_line
                    || topic.content != content =>
            {
                topic.start_line = start_line;
                topic.end_line = end_line;
                topic.content = content.to_string();
                true
            }
            _ => false,
        })?;
        Ok(())
    }

    /// Move every topic on `old` to `new` in one commit.
    ///
    /// Returns the number of topics moved.
    pub fn rename_document(&mut self, old: &str, new: &str) -> Result<usize> {
        let mut moved = 0;
        self.commit(|topics| {
            for topic in topics.iter_mut().filter(|t| t.document_path == old) {
                topic.document_path = new.to_string();
                moved += 1;
            }
            moved > 0 && old != new
        })?;
        Ok(moved)
    }

    /// Follow a document rename; absent ids are ignored
    #[allow(dead_code)]
    pub fn update_document_path(&mut self, id: &str, new_path: &str) -> Result<()> {
        self.commit(|topics| match topics.iter_mut().find(|t| t.id == id) {
            Some(topic) if topic.document_path != new_path => {
                topic.document_path = new_path.to_string();
                true
            }
            _ => false,
        })?;
        Ok(())
    }

    /// Register an observer called after every committed change
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.observers.retain(|(sub, _)| *sub != id);
    }

    /// Run every observer in registration order.
    ///
    /// A failing or panicking observer is logged and the rest still run.
    pub fn notify(&mut self) {
        for (id, observer) in self.observers.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| observer())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("topic observer {} failed: {:#}", id, e),
                Err(_) => log::error!("topic observer {} panicked", id),
            }
        }
    }

    #[cfg(test)]
    pub fn blob_ref(&self) -> &B {
        &self.blob
    }

    #[cfg(test)]
    pub fn blob_mut(&mut self) -> &mut B {
        &mut self.blob
    }

    /// Apply `mutate`; when it reports a change, save and notify or roll back
    fn commit<F>(&mut self, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<Topic>) -> bool,
    {
        let snapshot = self.topics.clone();
        if !mutate(&mut self.topics) {
            return Ok(false);
        }

        if let Err(e) = self.persist() {
            log::warn!("saving topics failed, rolling back: {}", e);
            self.topics = snapshot;
            return Err(e);
        }

        self.notify();
        Ok(true)
    }

    fn persist(&mut self) -> Result<()> {
        let topics = serde_json::to_value(&self.topics)?;
        merge_save(
            &mut self.blob,
            vec![
                ("version", serde_json::json!(SCHEMA_VERSION)),
                ("topics", topics),
            ],
        )
    }
}

fn parse_topic_data(value: serde_json::Value) -> Result<TopicData> {
    let has_version = value.as_object().map(|o| o.contains_key("version")).unwrap_or(false);
    if !has_version {
        return Err(TopicError::MalformedPersistedState(
            "no version field".to_string(),
        ));
    }

    let data: TopicData = serde_json::from_value(value)
        .map_err(|e| TopicError::MalformedPersistedState(e.to_string()))?;

    if data.version != SCHEMA_VERSION {
        return Err(TopicError::MalformedPersistedState(format!(
            "unsupported version {}",
            data.version
        )));
    }

    Ok(data)
}

/// Drop duplicate ids/anchors and entries beyond capacity from loaded data
fn sanitize(topics: Vec<Topic>) -> Vec<Topic> {
    let mut ids = HashSet::new();
    let mut anchors = HashSet::new();
    let mut kept = Vec::with_capacity(topics.len().min(MAX_TOPICS));

    for mut topic in topics {
        if !ids.insert(topic.id.clone()) {
            log::warn!("dropping topic with duplicate id {}", topic.id);
            continue;
        }
        if !anchors.insert(topic.anchor_token.clone()) {
            log::warn!("dropping topic {} with duplicate anchor {}", topic.id, topic.anchor_token);
            continue;
        }
        if !is_anchor_token(&topic.anchor_token) {
            log::warn!("dropping topic {} with malformed anchor '{}'", topic.id, topic.anchor_token);
            continue;
        }
        if kept.len() == MAX_TOPICS {
            log::warn!("dropping topic {}: more than {} stored", topic.id, MAX_TOPICS);
            continue;
        }
        if topic.end_line < topic.start_line {
            topic.end_line = topic.start_line;
        }
        if topic.line_span > MAX_LINE_SPAN {
            log::warn!("topic {}: clamping line span {}", topic.id, topic.line_span);
            topic.line_span = topic.end_line - topic.start_line + 1;
        }
        topic.line_span = topic.line_span.max(1);
        kept.push(topic);
    }

    kept
}
