//! Character-level diffs of syntax-highlighted lines.
//!
//! Highlighters emit HTML, and diffing HTML character by character would
//! cut straight through tags and entities. Instead every tag and entity is
//! swapped for a single private-use placeholder character before diffing,
//! and swapped back afterwards with any tag left open by a segment boundary
//! closed again. See [`HighlightCodeDiff`].

mod cleanup;
mod placeholder;

pub use placeholder::HighlightCodeDiff;

use crate::diff::DiffLineType;
use serde::Serialize;

/// Turns source code into HTML.
///
/// The output may contain `<span ...>` tags and HTML entities; everything
/// else is treated as literal text.
pub trait Highlighter {
    /// Highlight a single line or snippet.
    fn code(&self, file_name: &str, language: Option<&str>, code: &str) -> String;

    /// Highlight a whole file, one entry per line.
    fn file(&self, file_name: &str, language: Option<&str>, code: &str) -> Vec<String> {
        code.lines()
            .map(|line| self.code(file_name, language, line))
            .collect()
    }
}

/// Highlighter that only escapes HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn code(&self, _file_name: &str, _language: Option<&str>, code: &str) -> String {
        escape_html(code)
    }
}

/// Escape the characters that are significant in HTML text and attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Equal,
    Insert,
    Delete,
}

/// A run of HTML sharing one diff operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub op: Operation,
    pub text: String,
}

impl Segment {
    #[must_use]
    pub fn new(op: Operation, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// Tuning for [`HighlightCodeDiff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineDiffOptions {
    /// Size of the placeholder pool, starting at U+100000
    pub placeholder_max_count: u32,
    /// Byte length below which an equality between edits is folded into them
    pub edit_cost: usize,
}

impl Default for InlineDiffOptions {
    fn default() -> Self {
        Self {
            placeholder_max_count: 64000,
            edit_cost: 100,
        }
    }
}

const ADDED_CODE: &str = r#"<span class="added-code">"#;
const REMOVED_CODE: &str = r#"<span class="removed-code">"#;
const CLOSE_SPAN: &str = "</span>";

/// Render diff segments as the HTML for a line of type `kind`.
///
/// Equal segments are always shown. Inserted text is shown, wrapped, only
/// on an added line and deleted text only on a removed line. Any
/// `line_wrapper_tags` open the output and are closed at its end.
#[must_use]
pub fn diff_to_html(line_wrapper_tags: &[String], segments: &[Segment], kind: DiffLineType) -> String {
    let mut out = String::new();
    for tag in line_wrapper_tags {
        out.push_str(tag);
    }
    for segment in segments {
        match (segment.op, kind) {
            (Operation::Equal, _) => out.push_str(&segment.text),
            (Operation::Insert, DiffLineType::Add) => {
                out.push_str(ADDED_CODE);
                out.push_str(&segment.text);
                out.push_str(CLOSE_SPAN);
            }
            (Operation::Delete, DiffLineType::Del) => {
                out.push_str(REMOVED_CODE);
                out.push_str(&segment.text);
                out.push_str(CLOSE_SPAN);
            }
            _ => {}
        }
    }
    for _ in line_wrapper_tags {
        out.push_str(CLOSE_SPAN);
    }
    out
}
