//! Topic definition and persisted schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::model::{RangeLine, ResultItem};

/// Current persisted schema version
pub const SCHEMA_VERSION: u32 = 1;

/// A bookmarked line range within one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Document path relative to root
    #[serde(alias = "filePath")]
    pub document_path: String,

    /// Start line (0-indexed, inclusive)
    pub start_line: usize,

    /// End line (0-indexed, inclusive)
    pub end_line: usize,

    /// Last-known text of the range, anchor stripped
    #[serde(rename = "originalContent")]
    pub content: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Anchor embedded at the end of the first line
    #[serde(alias = "blockId")]
    pub anchor_token: String,

    /// Number of lines registered (end - start + 1)
    #[serde(alias = "lineCount")]
    pub line_span: usize,
}

impl Topic {
    /// Create a topic with a fresh id and timestamp
    pub fn new(
        document_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content: impl Into<String>,
        anchor_token: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_path: document_path.into(),
            start_line,
            end_line,
            content: content.into(),
            created_at: Utc::now(),
            anchor_token: anchor_token.into(),
            line_span: end_line.saturating_sub(start_line) + 1,
        }
    }

    /// Whether the cached range shares a line with `start..=end`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        crate::core::util::ranges_overlap((self.start_line, self.end_line), (start, end))
    }

    /// Convert to a ResultItem; `index` is the 0-based slot
    pub fn to_result_item(&self, index: Option<usize>) -> ResultItem {
        let mut data = serde_json::json!({
            "id": self.id,
            "anchor": self.anchor_token,
            "span": self.line_span,
            "created_at": self.created_at.to_rfc3339(),
        });
        if let Some(i) = index {
            data["index"] = serde_json::json!(i + 1);
        }

        ResultItem::topic(
            self.document_path.clone(),
            RangeLine::from_zero_based(self.start_line, self.end_line),
        )
        .with_excerpt(self.content.clone())
        .with_data(data)
    }
}

/// Persisted representation of the topic collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicData {
    pub version: u32,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Default for TopicData {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            topics: Vec::new(),
        }
    }
}
