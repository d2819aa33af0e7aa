//! Unified Result Model
//!
//! Every command maps its outcome to this model before rendering output.
//! Line ranges here are 1-indexed and inclusive, matching the command line.

use serde::{Deserialize, Serialize};

use crate::core::error::TopicError;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Topic,
    Sync,
    Document,
    Setting,
    Error,
}

/// Tracking status of a topic as seen by the command that produced the item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Anchor found, cached position current
    Ok,
    /// Position or content was re-derived and committed
    Updated,
    /// Reconciled, nothing changed
    Unchanged,
    /// Anchor not found in the document; last-known position kept
    Stale,
    /// Document does not exist
    Missing,
    /// Topic was removed
    Removed,
}

/// Line-based range (1-indexed, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLine {
    pub start: usize,
    pub end: usize,
}

impl RangeLine {
    /// Build a display range from zero-based inclusive bounds
    pub fn from_zero_based(start: usize, end: usize) -> Self {
        Self {
            start: start + 1,
            end: end + 1,
        }
    }
}

/// Error information for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub message: String,
}

impl Issue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&TopicError> for Issue {
    fn from(err: &TopicError) -> Self {
        Issue::new(err.code(), err.to_string())
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The kind of this result
    pub kind: Kind,

    /// Document path relative to root, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Line range within the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeLine>,

    /// Topic content or a human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// Tracking status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,

    /// Structured payload (topic id, anchor, slot index, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Errors (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Issue>,
}

impl ResultItem {
    fn empty(kind: Kind) -> Self {
        Self {
            kind,
            path: None,
            range: None,
            excerpt: None,
            status: None,
            data: None,
            errors: Vec::new(),
        }
    }

    /// Create a new topic result
    pub fn topic(path: impl Into<String>, range: RangeLine) -> Self {
        Self {
            path: Some(path.into()),
            range: Some(range),
            ..Self::empty(Kind::Topic)
        }
    }

    /// Create a new sync result for one document
    pub fn sync(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::empty(Kind::Sync)
        }
    }

    /// Create a new document result
    pub fn document(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::empty(Kind::Document)
        }
    }

    /// Create a new setting result
    pub fn setting(name: &str, value: serde_json::Value) -> Self {
        Self {
            excerpt: Some(name.to_string()),
            data: Some(value),
            ..Self::empty(Kind::Setting)
        }
    }

    /// Create a new error result
    pub fn error(issue: Issue) -> Self {
        Self {
            errors: vec![issue],
            ..Self::empty(Kind::Error)
        }
    }

    /// Set document path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set status
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set excerpt
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Set structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add an error
    pub fn with_error(mut self, issue: Issue) -> Self {
        self.errors.push(issue);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ResultItem>) {
        self.items.extend(items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
