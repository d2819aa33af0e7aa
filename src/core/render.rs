//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, ResultItem, ResultSet, Status};
use crate::core::text::{dedent, file_name};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render and print to stdout
    pub fn print(&self, result_set: &ResultSet) {
        let output = self.render(result_set);
        if !output.is_empty() {
            println!("{}", output);
        }
    }

    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut topics = Vec::new();
        let mut syncs = Vec::new();
        let mut documents = Vec::new();
        let mut settings = Vec::new();
        let mut errors = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Topic => topics.push(item),
                Kind::Sync => syncs.push(item),
                Kind::Document => documents.push(item),
                Kind::Setting => settings.push(item),
                Kind::Error => errors.push(item),
            }
        }

        if !errors.is_empty() {
            output.push_str("## Errors\n\n");
            for item in errors {
                for error in &item.errors {
                    output.push_str(&format!("- **{}**: {}\n", error.code, error.message));
                }
            }
            output.push('\n');
        }

        if !topics.is_empty() {
            output.push_str("## Topics\n\n");
            for (i, item) in topics.into_iter().enumerate() {
                self.render_topic_md(&mut output, i + 1, item);
            }
        }

        if !syncs.is_empty() {
            output.push_str("## Sync\n\n");
            for item in syncs {
                self.render_line_md(&mut output, item);
            }
            output.push('\n');
        }

        if !documents.is_empty() {
            output.push_str("## Documents\n\n");
            for item in documents {
                self.render_line_md(&mut output, item);
            }
            output.push('\n');
        }

        if !settings.is_empty() {
            output.push_str("## Settings\n\n");
            for item in settings {
                let name = item.excerpt.as_deref().unwrap_or("");
                let value = item
                    .data
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                output.push_str(&format!("- `{}` = {}\n", name, value));
            }
            output.push('\n');
        }

        output.trim_end().to_string()
    }

    fn render_topic_md(&self, output: &mut String, number: usize, item: &ResultItem) {
        let path = item.path.as_deref().unwrap_or("");
        output.push_str(&format!("### {}. `{}`", number, file_name(path)));
        if let Some(range) = &item.range {
            output.push_str(&format!(" (lines {}-{})", range.start, range.end));
        }
        output.push('\n');

        if let Some(excerpt) = &item.excerpt {
            output.push_str("\n```\n");
            let body = dedent(excerpt);
            output.push_str(&body);
            if !body.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("```\n");
        }

        match item.status {
            Some(Status::Missing) => output.push_str("\n> ⚠ File not found\n"),
            Some(Status::Stale) => output.push_str("\n> ⚠ Anchor not found, position may be outdated\n"),
            _ => {}
        }

        output.push('\n');
    }

    fn render_line_md(&self, output: &mut String, item: &ResultItem) {
        output.push_str("- ");
        if let Some(path) = &item.path {
            output.push_str(&format!("`{}`", path));
        }
        if let Some(range) = &item.range {
            output.push_str(&format!(" (lines {}-{})", range.start, range.end));
        }
        if let Some(status) = item.status {
            output.push_str(&format!(" [{}]", status_label(status)));
        }
        if let Some(excerpt) = &item.excerpt {
            output.push_str(&format!(": {}", excerpt.lines().next().unwrap_or("")));
        }
        output.push('\n');
    }

    /// Raw mode: excerpts only
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| item.excerpt.clone())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Ok => "ok",
        Status::Updated => "updated",
        Status::Unchanged => "unchanged",
        Status::Stale => "stale",
        Status::Missing => "missing",
        Status::Removed => "removed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(format: OutputFormat) -> Renderer {
        Renderer::with_config(RenderConfig::with_pretty(format, false))
    }
    use crate::core::model::{Issue, RangeLine};

    fn topic_item(path: &str, excerpt: &str) -> ResultItem {
        ResultItem::topic(path, RangeLine::from_zero_based(0, 1)).with_excerpt(excerpt)
    }

    #[test]
    fn test_render_jsonl() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("a.md", "one"));
        result_set.push(topic_item("b.md", "two"));

        let output = renderer(OutputFormat::Jsonl).render(&result_set);

        assert!(output.contains("a.md"));
        assert!(output.contains("b.md"));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_render_json() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("a.md", "one"));

        let output = renderer(OutputFormat::Json).render(&result_set);

        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("invalid"
            .parse::<OutputFormat>()
            .unwrap_err()
            .contains("Unknown format"));
    }

    #[test]
    fn test_render_jsonl_pretty() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("a.md", "one"));

        let config = RenderConfig::with_pretty(OutputFormat::Jsonl, true);
        let output = Renderer::with_config(config).render(&result_set);

        assert!(output.contains("\n  "));
    }

    #[test]
    fn test_render_markdown_empty() {
        let output = renderer(OutputFormat::Markdown).render(&ResultSet::new());
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_markdown_topics_are_numbered_and_dedented() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("notes/a.md", "    indented\n    body"));
        result_set.push(topic_item("notes/b.md", "second"));

        let output = renderer(OutputFormat::Markdown).render(&result_set);

        assert!(output.contains("## Topics"));
        assert!(output.contains("### 1. `a.md` (lines 1-2)"));
        assert!(output.contains("### 2. `b.md`"));
        assert!(output.contains("indented\nbody"));
    }

    #[test]
    fn test_render_markdown_flags_missing_document() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("gone.md", "x").with_status(Status::Missing));

        let output = renderer(OutputFormat::Markdown).render(&result_set);

        assert!(output.contains("File not found"));
    }

    #[test]
    fn test_render_markdown_errors() {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::error(Issue::new("CAPACITY_EXCEEDED", "full")));

        let output = renderer(OutputFormat::Markdown).render(&result_set);

        assert!(output.contains("## Errors"));
        assert!(output.contains("**CAPACITY_EXCEEDED**: full"));
    }

    #[test]
    fn test_render_markdown_settings() {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::setting("debounce-ms", serde_json::json!(300)));

        let output = renderer(OutputFormat::Markdown).render(&result_set);

        assert!(output.contains("`debounce-ms` = 300"));
    }

    #[test]
    fn test_render_raw() {
        let mut result_set = ResultSet::new();
        result_set.push(topic_item("a.md", "content 1"));
        result_set.push(topic_item("b.md", "content 2"));
        result_set.push(ResultItem::document("c.md"));

        let output = renderer(OutputFormat::Raw).render(&result_set);

        assert_eq!(output, "content 1\n---\ncontent 2");
    }
}
