use serde::Serialize;
use std::num::NonZeroU32;

/// Kind of a single line inside a [`DiffSection`](super::DiffSection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineType {
    /// Unchanged context line
    Plain,
    /// Line only present in the new file
    Add,
    /// Line only present in the old file
    Del,
    /// Hunk header pseudo-line (`@@ -l,s +l,s @@`)
    Section,
}

impl DiffLineType {
    /// Marker character used for this line type in unified diff output
    #[must_use]
    pub fn marker(self) -> Option<char> {
        match self {
            Self::Plain => Some(' '),
            Self::Add => Some('+'),
            Self::Del => Some('-'),
            Self::Section => None,
        }
    }
}

/// Hunk boundaries carried by a [`DiffLineType::Section`] line.
///
/// `last_*` fields point at the last line shown by the previous hunk (0 when
/// this is the first hunk); `left_idx`/`right_idx` are this hunk's first
/// lines as declared by its header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionInfo {
    pub path: String,
    pub last_left_idx: u32,
    pub last_right_idx: u32,
    pub left_idx: u32,
    pub right_idx: u32,
    pub left_hunk_size: u32,
    pub right_hunk_size: u32,
}

/// Which "expand context" affordance a section header offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandDirection {
    None,
    Single,
    UpDown,
    Up,
    Down,
}

/// Number of lines revealed by one expand step.
pub const BLOB_EXCERPT_CHUNK_SIZE: u32 = 20;

impl SectionInfo {
    #[must_use]
    pub fn expand_direction(&self) -> ExpandDirection {
        let gap = self.right_idx.saturating_sub(self.last_right_idx);
        if gap <= 1 {
            ExpandDirection::None
        } else if self.last_left_idx == 0 && self.last_right_idx == 0 {
            ExpandDirection::Up
        } else if gap > BLOB_EXCERPT_CHUNK_SIZE && self.right_hunk_size > 0 {
            ExpandDirection::UpDown
        } else if self.left_hunk_size == 0 && self.right_hunk_size == 0 {
            ExpandDirection::Down
        } else {
            ExpandDirection::Single
        }
    }
}

/// Side of the diff a comment is anchored on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSide {
    Previous,
    Proposed,
}

/// An externally supplied review comment.
///
/// `line` is negative for the old (left) side and positive for the new
/// (right) side, matching how review systems usually store anchors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeComment {
    pub line: i64,
    pub author: String,
    pub body: String,
    pub created_unix: i64,
}

/// One physical line of a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    /// Line number in the old file, absent for additions and section lines
    pub left_idx: Option<NonZeroU32>,
    /// Line number in the new file, absent for deletions and section lines
    pub right_idx: Option<NonZeroU32>,
    /// Index (within the same section) of the add/del line this one pairs with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<usize>,
    #[serde(rename = "type")]
    pub kind: DiffLineType,
    /// Raw text including the leading marker, or the full `@@` header
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<CodeComment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_info: Option<SectionInfo>,
}

impl DiffLine {
    /// A line with no pairing, comments or section info
    #[must_use]
    pub fn new(
        kind: DiffLineType,
        left_idx: u32,
        right_idx: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            left_idx: NonZeroU32::new(left_idx),
            right_idx: NonZeroU32::new(right_idx),
            matched: None,
            kind,
            content: content.into(),
            comments: Vec::new(),
            section_info: None,
        }
    }

    /// A hunk header pseudo-line carrying its parsed boundaries
    #[must_use]
    pub fn section(content: impl Into<String>, info: SectionInfo) -> Self {
        Self {
            section_info: Some(info),
            ..Self::new(DiffLineType::Section, 0, 0, content)
        }
    }

    /// Content without the leading marker character
    #[must_use]
    pub fn text(&self) -> &str {
        match self.kind {
            DiffLineType::Section => &self.content,
            _ => self.content.get(1..).unwrap_or_default(),
        }
    }

    /// Old-side line number, 0 when absent
    #[must_use]
    pub fn left(&self) -> u32 {
        self.left_idx.map_or(0, NonZeroU32::get)
    }

    /// New-side line number, 0 when absent
    #[must_use]
    pub fn right(&self) -> u32 {
        self.right_idx.map_or(0, NonZeroU32::get)
    }

    #[must_use]
    pub fn can_comment(&self) -> bool {
        self.kind != DiffLineType::Section
    }

    #[must_use]
    pub fn comment_side(&self) -> CommentSide {
        match self.kind {
            DiffLineType::Del => CommentSide::Previous,
            _ => CommentSide::Proposed,
        }
    }

    /// Signed anchor used by [`CodeComment::line`]
    #[must_use]
    pub fn comment_anchor(&self) -> Option<i64> {
        match self.kind {
            DiffLineType::Section => None,
            DiffLineType::Del => self.left_idx.map(|n| -i64::from(n.get())),
            _ => self.right_idx.map(|n| i64::from(n.get())),
        }
    }
}
