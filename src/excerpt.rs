//! Synthetic sections that reveal unchanged context between hunks.
//!
//! A diff only shows a few lines around each change. Expanding the gap
//! between two hunks (or after the last one) reads the file itself and
//! turns the requested window into plain context lines. Large gaps are
//! revealed one chunk at a time, and a fresh hunk header is emitted so the
//! remaining gap can be expanded again.

use crate::diff::{BLOB_EXCERPT_CHUNK_SIZE, DiffLine, DiffLineType, DiffSection, SectionInfo};
use crate::highlight::{Highlighter, escape_html};
use crate::scan::reader::LineReader;
use error_set::error_set;
use std::io::BufRead;
use tracing::debug;

error_set! {
    /// Errors raised while building an excerpt
    ExcerptError := {
        IoError(std::io::Error),
    }
}

/// Which way to grow the revealed context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcerptDirection {
    /// Reveal lines just above the next hunk
    Up,
    /// Reveal lines just below the previous hunk
    Down,
    /// Reveal the whole gap
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptOptions {
    /// Last line shown by the previous hunk, 0 at the top of the file
    pub last_left: u32,
    pub last_right: u32,
    /// First line of the next hunk
    pub left_index: u32,
    pub right_index: u32,
    pub left_hunk_size: u32,
    pub right_hunk_size: u32,
    pub direction: ExcerptDirection,
    pub language: Option<String>,
    /// Lines past this many bytes are modeled but not highlighted
    pub max_highlight_bytes: usize,
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            last_left: 0,
            last_right: 0,
            left_index: 0,
            right_index: 0,
            left_hunk_size: 0,
            right_hunk_size: 0,
            direction: ExcerptDirection::All,
            language: None,
            max_highlight_bytes: 8 * 1024 * 1024,
        }
    }
}

impl ExcerptOptions {
    /// Request expanding the gap above the hunk described by `info`.
    #[must_use]
    pub fn from_section(info: &SectionInfo, direction: ExcerptDirection) -> Self {
        Self {
            last_left: info.last_left_idx,
            last_right: info.last_right_idx,
            left_index: info.left_idx,
            right_index: info.right_idx,
            left_hunk_size: info.left_hunk_size,
            right_hunk_size: info.right_hunk_size,
            direction,
            ..Self::default()
        }
    }
}

/// Build the section revealed by one expand request.
///
/// `reader` yields the full current content of `file_path`. With
/// [`ExcerptDirection::Up`] or [`ExcerptDirection::Down`] and a gap wider
/// than one chunk, only one chunk is revealed and a new section header
/// line (first for up, last for down) describes what is left.
///
/// # Errors
///
/// Returns [`ExcerptError::IoError`] when reading the file fails.
pub fn build_blob_excerpt_section<R: BufRead>(
    file_path: &str,
    reader: R,
    options: &ExcerptOptions,
    highlighter: &dyn Highlighter,
) -> Result<DiffSection, ExcerptError> {
    let chunk = BLOB_EXCERPT_CHUNK_SIZE;
    let mut last_left = options.last_left;
    let mut last_right = options.last_right;
    let mut left_index = options.left_index;
    let mut right_index = options.right_index;
    let mut left_hunk_size = options.left_hunk_size;
    let mut right_hunk_size = options.right_hunk_size;
    let gap = left_index.saturating_sub(last_left);

    let mut input = LineReader::new(reader);
    let window = match options.direction {
        ExcerptDirection::Up if gap > chunk => {
            left_index -= chunk;
            right_index = right_index.saturating_sub(chunk);
            left_hunk_size = left_hunk_size.saturating_add(chunk);
            right_hunk_size = right_hunk_size.saturating_add(chunk);
            Window {
                left: left_index - 1,
                right: right_index.saturating_sub(1),
                count: chunk,
            }
        }
        ExcerptDirection::Down if gap > chunk => {
            let window = Window {
                left: last_left,
                right: last_right,
                count: chunk,
            };
            last_left = last_left.saturating_add(chunk);
            last_right = last_right.saturating_add(chunk);
            window
        }
        direction => {
            let span = right_index.saturating_sub(last_right);
            let count = if direction == ExcerptDirection::Down {
                span
            } else {
                span.saturating_sub(1)
            };
            let window = Window {
                left: last_left,
                right: last_right,
                count,
            };
            left_hunk_size = 0;
            right_hunk_size = 0;
            left_index = last_left;
            right_index = last_right;
            window
        }
    };
    debug!(
        path = file_path,
        direction = ?options.direction,
        from = window.right.saturating_add(1),
        count = window.count,
        "building excerpt"
    );

    let mut section = DiffSection::new(file_path);
    section.lines = window.read(&mut input)?;
    highlight_window(&mut section, options, highlighter);

    if right_index > last_right {
        let header = if left_hunk_size > 0 || right_hunk_size > 0 {
            format!("@@ -{left_index},{left_hunk_size} +{right_index},{right_hunk_size} @@")
        } else {
            " ".to_string()
        };
        let line = DiffLine::section(
            escape_html(&header),
            SectionInfo {
                path: file_path.to_string(),
                last_left_idx: last_left,
                last_right_idx: last_right,
                left_idx: left_index,
                right_idx: right_index,
                left_hunk_size,
                right_hunk_size,
            },
        );
        match options.direction {
            ExcerptDirection::Up => section.lines.insert(0, line),
            ExcerptDirection::Down => section.lines.push(line),
            ExcerptDirection::All => {}
        }
    }
    Ok(section)
}

/// `count` lines following right-side line `right` (0-based start)
struct Window {
    left: u32,
    right: u32,
    count: u32,
}

impl Window {
    fn read<R: BufRead>(&self, input: &mut LineReader<R>) -> Result<Vec<DiffLine>, ExcerptError> {
        let mut lines = Vec::with_capacity(self.count as usize);
        let end = self.right.saturating_add(self.count);
        let mut line_no = 0;
        while line_no < end {
            let Some(raw) = input.read_line(None)? else {
                break;
            };
            if line_no >= self.right {
                lines.push(DiffLine::new(
                    DiffLineType::Plain,
                    self.left.saturating_add(line_no - self.right + 1),
                    line_no + 1,
                    format!(" {}", raw.text()),
                ));
            }
            line_no += 1;
        }
        Ok(lines)
    }
}

fn highlight_window(section: &mut DiffSection, options: &ExcerptOptions, highlighter: &dyn Highlighter) {
    let mut buffer = String::new();
    let mut numbers = Vec::new();
    for line in &section.lines {
        let text = line.text();
        if buffer.len() + text.len() + 1 > options.max_highlight_bytes {
            debug!(path = %section.file_name, "excerpt too large, highlighting cut short");
            break;
        }
        buffer.push_str(text);
        buffer.push('\n');
        numbers.push(line.right());
    }
    if numbers.is_empty() {
        return;
    }

    let highlighted = highlighter.file(&section.file_name, options.language.as_deref(), &buffer);
    section.highlighted_lines = numbers.into_iter().zip(highlighted).collect();
}
