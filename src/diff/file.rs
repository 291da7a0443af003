use super::line::{DiffLine, SectionInfo};
use super::section::DiffSection;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// How a file changed between the two trees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffFileType {
    Add,
    #[default]
    Change,
    Delete,
    Rename,
    Copy,
}

/// All changes to a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffFile {
    /// Current path
    pub name: String,
    /// Previous path, equal to `name` unless renamed or copied
    pub old_name: String,
    /// 1-based position within the owning [`Diff`](super::Diff)
    pub index: usize,
    pub addition: usize,
    pub deletion: usize,
    #[serde(rename = "type")]
    pub kind: DiffFileType,
    pub is_created: bool,
    pub is_deleted: bool,
    pub is_bin: bool,
    pub is_lfs_file: bool,
    pub is_renamed: bool,
    /// Names could not yet be told apart from the `diff --git` line alone
    pub is_ambiguous: bool,
    pub is_submodule: bool,
    pub is_incomplete: bool,
    pub is_incomplete_line_too_long: bool,
    /// Set by callers that protect certain paths; never touched by the scanner
    pub is_protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submodule_url: Option<String>,
    pub sections: Vec<DiffSection>,
}

impl DiffFile {
    /// Name to show for the file, falling back to the old name for deletions
    #[must_use]
    pub fn diff_file_name(&self) -> &str {
        if self.name.is_empty() {
            &self.old_name
        } else {
            &self.name
        }
    }

    /// Section revealing the unchanged lines after the last hunk.
    ///
    /// Line counts come from whatever blob store the caller uses; `None`
    /// means the count could not be determined and no tail is offered.
    #[must_use]
    pub fn tail_section(
        &self,
        left_line_count: Option<u32>,
        right_line_count: Option<u32>,
    ) -> Option<DiffSection> {
        if self.kind != DiffFileType::Change || self.is_bin || self.is_lfs_file {
            return None;
        }
        let last = self.sections.last()?.lines.last()?;

        let (Some(left_count), Some(right_count)) = (left_line_count, right_line_count) else {
            debug!(file = %self.name, "line count unavailable, no tail section");
            return None;
        };
        if left_count <= last.left() || right_count <= last.right() {
            return None;
        }

        let info = SectionInfo {
            path: self.name.clone(),
            last_left_idx: last.left(),
            last_right_idx: last.right(),
            left_idx: left_count,
            right_idx: right_count,
            left_hunk_size: 0,
            right_hunk_size: 0,
        };
        let mut section = DiffSection::new(self.name.clone());
        section.lines.push(DiffLine::section(" ", info));
        Some(section)
    }

    /// All lines across sections, in order
    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.sections.iter().flat_map(|s| s.lines.iter())
    }
}

impl fmt::Display for DiffFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "diff --git a/{} b/{}", self.old_name, self.name)?;
        match self.kind {
            DiffFileType::Add => writeln!(f, "new file mode 100644")?,
            DiffFileType::Delete => writeln!(f, "deleted file mode 100644")?,
            DiffFileType::Rename if self.is_renamed => {
                writeln!(f, "rename from {}", self.old_name)?;
                writeln!(f, "rename to {}", self.name)?;
            }
            DiffFileType::Copy => {
                writeln!(f, "copy from {}", self.old_name)?;
                writeln!(f, "copy to {}", self.name)?;
            }
            _ => {}
        }
        if self.is_bin {
            return writeln!(
                f,
                "Binary files a/{} and b/{} differ",
                self.old_name, self.name
            );
        }
        if self.sections.is_empty() {
            return Ok(());
        }
        match self.kind {
            DiffFileType::Add => writeln!(f, "--- /dev/null")?,
            _ => writeln!(f, "--- a/{}", self.old_name)?,
        }
        match self.kind {
            DiffFileType::Delete => writeln!(f, "+++ /dev/null")?,
            _ => writeln!(f, "+++ b/{}", self.name)?,
        }
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        Ok(())
    }
}
