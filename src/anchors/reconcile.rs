//! Reconciler - re-derive a topic's position from its anchor
//!
//! Only the first line of a topic carries an anchor. The current start line is
//! wherever that anchor is now; the end line keeps the original span, clamped to
//! the end of the document.

use crate::anchors::codec::{detach, locate};
use crate::core::error::{Result, TopicError};
use crate::topics::topic::Topic;

/// Position and content derived from the current document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
}

impl Reconciled {
    /// Whether committing this result would change the cached topic
    pub fn differs_from(&self, topic: &Topic) -> bool {
        self.start_line != topic.start_line
            || self.end_line != topic.end_line
            || self.content != topic.content
    }
}

/// Locate `token` in `lines` and rebuild the range it anchors.
///
/// `path` is only used for the error value.
pub fn reconcile<S: AsRef<str>>(
    lines: &[S],
    token: &str,
    line_span: usize,
    path: &str,
) -> Result<Reconciled> {
    let start_line = locate(lines, token).ok_or_else(|| TopicError::AnchorMissing {
        token: token.to_string(),
        path: path.to_string(),
    })?;

    let span = line_span.max(1);
    let end_line = start_line.saturating_add(span - 1).min(lines.len() - 1);

    Ok(Reconciled {
        start_line,
        end_line,
        content: range_content(lines, start_line, end_line),
    })
}

/// Reconcile a stored topic against its document's lines
pub fn reconcile_topic<S: AsRef<str>>(lines: &[S], topic: &Topic) -> Result<Reconciled> {
    reconcile(lines, &topic.anchor_token, topic.line_span, &topic.document_path)
}

/// Text of `lines[start..=end]` with the anchor stripped from the first line.
///
/// Callers guarantee `start <= end < lines.len()`.
pub fn range_content<S: AsRef<str>>(lines: &[S], start: usize, end: usize) -> String {
    lines[start..=end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                detach(line.as_ref())
            } else {
                line.as_ref().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::codec::attach;

    const TOKEN: &str = "topic-test0001";

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn anchored(lines: &[&str], at: usize) -> Vec<String> {
        let mut out = doc(lines);
        out[at] = attach(&out[at], TOKEN);
        out
    }

    #[test]
    fn test_reconcile_in_place() {
        let lines = anchored(&["a", "b", "c", "d", "e"], 2);
        let result = reconcile(&lines, TOKEN, 1, "doc.md").unwrap();
        assert_eq!(result.start_line, 2);
        assert_eq!(result.end_line, 2);
        assert_eq!(result.content, "c");
    }

    #[test]
    fn test_reconcile_after_insert_above() {
        let mut lines = anchored(&["a", "b", "c", "d", "e"], 2);
        lines.insert(0, "new 1".to_string());
        lines.insert(0, "new 0".to_string());

        let result = reconcile(&lines, TOKEN, 1, "doc.md").unwrap();
        assert_eq!(result.start_line, 4);
        assert_eq!(result.end_line, 4);
        assert_eq!(result.content, "c");
    }

    #[test]
    fn test_reconcile_clamps_to_truncated_document() {
        let lines = anchored(&["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"], 2);
        let truncated = lines[..3].to_vec();

        let result = reconcile(&truncated, TOKEN, 3, "doc.md").unwrap();
        assert_eq!(result.start_line, 2);
        assert_eq!(result.end_line, 2);
        assert_eq!(result.content, "2");
    }

    #[test]
    fn test_reconcile_keeps_span() {
        let lines = anchored(&["title", "first", "second", "third", "after"], 1);
        let result = reconcile(&lines, TOKEN, 3, "doc.md").unwrap();
        assert_eq!(result.start_line, 1);
        assert_eq!(result.end_line, 3);
        assert_eq!(result.content, "first\nsecond\nthird");
    }

    #[test]
    fn test_reconcile_anchor_missing() {
        let lines = doc(&["a", "b", "c"]);
        let err = reconcile(&lines, TOKEN, 1, "doc.md").unwrap_err();
        assert!(matches!(err, TopicError::AnchorMissing { ref token, .. } if token == TOKEN));
    }

    #[test]
    fn test_reconcile_empty_document() {
        let lines: Vec<String> = Vec::new();
        assert!(reconcile(&lines, TOKEN, 1, "doc.md").is_err());
    }

    #[test]
    fn test_reconcile_zero_span_is_single_line() {
        let lines = anchored(&["a", "b"], 0);
        let result = reconcile(&lines, TOKEN, 0, "doc.md").unwrap();
        assert_eq!(result.end_line, 0);
    }

    #[test]
    fn test_reconcile_huge_span_clamps_to_document_end() {
        let lines = anchored(&["a", "b", "c", "d"], 2);
        let result = reconcile(&lines, TOKEN, usize::MAX, "doc.md").unwrap();
        assert_eq!(result.start_line, 2);
        assert_eq!(result.end_line, 3);
        assert_eq!(result.content, "c\nd");
    }

    #[test]
    fn test_reconcile_is_pure_and_idempotent() {
        let lines = anchored(&["x", "y", "z"], 1);
        let first = reconcile(&lines, TOKEN, 2, "doc.md").unwrap();
        let second = reconcile(&lines, TOKEN, 2, "doc.md").unwrap();
        assert_eq!(first, second);

        let topic = Topic {
            start_line: first.start_line,
            end_line: first.end_line,
            content: first.content.clone(),
            ..Topic::new("doc.md", 1, 2, "y\nz", TOKEN)
        };
        assert!(!second.differs_from(&topic));
    }

    #[test]
    fn test_differs_from_detects_content_change() {
        let lines = anchored(&["x", "y edited", "z"], 1);
        let topic = Topic::new("doc.md", 1, 2, "y\nz", TOKEN);
        let result = reconcile_topic(&lines, &topic).unwrap();
        assert_eq!(result.start_line, 1);
        assert!(result.differs_from(&topic));
    }

    #[test]
    fn test_range_content_strips_only_first_anchor() {
        let lines = vec!["head ^topic-aaaa1111", "tail ^topic-bbbb2222"];
        assert_eq!(range_content(&lines, 0, 1), "head\ntail ^topic-bbbb2222");
    }
}
