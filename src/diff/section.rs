use super::line::{DiffLine, DiffLineType};
use crate::highlight::{
    HighlightCodeDiff, Highlighter, InlineDiffOptions, diff_to_html, escape_html,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One hunk of a file, or a synthetic excerpt/tail section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSection {
    /// Name of the owning file, kept so the section can be highlighted alone
    pub file_name: String,
    pub lines: Vec<DiffLine>,
    /// Pre-highlighted HTML keyed by new-side line number
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub highlighted_lines: BTreeMap<u32, String>,
}

impl DiffSection {
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Find the add or del line that sits opposite line `idx` of the other side.
    ///
    /// The offset between old and new numbering is taken from the last
    /// context line before the candidate; a match only counts when the run it
    /// belongs to has as many additions as deletions.
    #[must_use]
    pub fn get_line(&self, kind: DiffLineType, idx: u32) -> Option<&DiffLine> {
        let idx = i64::from(idx);
        let mut difference = 0_i64;
        let mut add_count = 0_usize;
        let mut del_count = 0_usize;
        let mut found = None;

        for line in &self.lines {
            match line.kind {
                DiffLineType::Add => add_count += 1,
                DiffLineType::Del => del_count += 1,
                _ => {
                    if found.is_some() {
                        break;
                    }
                    difference = i64::from(line.right()) - i64::from(line.left());
                    add_count = 0;
                    del_count = 0;
                }
            }

            let hit = match kind {
                DiffLineType::Del => {
                    line.right_idx.is_none() && i64::from(line.left()) == idx - difference
                }
                DiffLineType::Add => {
                    line.left_idx.is_none() && i64::from(line.right()) == idx + difference
                }
                _ => false,
            };
            if hit {
                found = Some(line);
            }
        }

        if add_count == del_count { found } else { None }
    }

    /// The line paired with `self.lines[index]`, if any
    fn counterpart(&self, index: usize) -> Option<&DiffLine> {
        let line = self.lines.get(index)?;
        if let Some(other) = line.matched.and_then(|m| self.lines.get(m)) {
            return Some(other);
        }
        match line.kind {
            DiffLineType::Add => self.get_line(DiffLineType::Del, line.right()),
            DiffLineType::Del => self.get_line(DiffLineType::Add, line.left()),
            _ => None,
        }
    }

    /// Render one line as HTML, diffing changed lines against their partner.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn inline_html(
        &self,
        index: usize,
        language: Option<&str>,
        highlighter: &dyn Highlighter,
        options: &InlineDiffOptions,
    ) -> Option<String> {
        let line = self.lines.get(index)?;
        let highlight = |code: &str| highlighter.code(&self.file_name, language, code);

        let (old, new) = match line.kind {
            DiffLineType::Section => {
                let text = line.text();
                return Some(if text.is_empty() {
                    "<br>".to_string()
                } else {
                    escape_html(text)
                });
            }
            DiffLineType::Plain => return Some(highlight(line.text())),
            DiffLineType::Add => match self.counterpart(index) {
                Some(del) => (del, line),
                None => return Some(highlight(line.text())),
            },
            DiffLineType::Del => match self.counterpart(index) {
                Some(add) => (line, add),
                None => return Some(highlight(line.text())),
            },
        };

        let mut hcd = HighlightCodeDiff::new(options);
        let segments = hcd.diff_with_highlight(
            &self.file_name,
            language,
            old.text(),
            new.text(),
            highlighter,
        );
        Some(diff_to_html(&[], &segments, line.kind))
    }
}

impl fmt::Display for DiffSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line.content)?;
        }
        Ok(())
    }
}
