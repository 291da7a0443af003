//! Structured model of a parsed patch.
//!
//! A [`Diff`] holds one [`DiffFile`] per `diff --git` entry; each file holds
//! its hunks as [`DiffSection`]s, and each section holds [`DiffLine`]s whose
//! first entry is the `@@` header pseudo-line.

pub mod file;
pub mod full;
pub mod line;
pub mod section;

pub use file::{DiffFile, DiffFileType};
pub use full::{Diff, SubmoduleLookup};
pub use line::{
    BLOB_EXCERPT_CHUNK_SIZE, CodeComment, CommentSide, DiffLine, DiffLineType, ExpandDirection,
    SectionInfo,
};
pub use section::DiffSection;

/// Format a parsed diff for display with explicit line numbers
pub fn format_diff(diff: &Diff) -> String {
    let mut result = String::new();

    for file in &diff.files {
        result.push_str(&format!(
            "{} (+{} -{})",
            file.diff_file_name(),
            file.addition,
            file.deletion
        ));
        if file.is_bin {
            result.push_str(" binary");
        }
        if file.is_incomplete {
            result.push_str(" truncated");
        }
        result.push_str(":\n");

        for section in &file.sections {
            for line in &section.lines {
                match line.kind {
                    DiffLineType::Section => {}
                    DiffLineType::Del => {
                        result.push_str(&format!("  -{}:\t{}\n", line.left(), line.text()));
                    }
                    DiffLineType::Add => {
                        result.push_str(&format!("  +{}:\t{}\n", line.right(), line.text()));
                    }
                    DiffLineType::Plain => {
                        result.push_str(&format!("   {}:\t{}\n", line.right(), line.text()));
                    }
                }
            }
            result.push('\n');
        }
    }

    if diff.is_incomplete {
        result.push_str("(diff truncated)\n");
    }

    // Remove trailing newline if present
    if result.ends_with("\n\n") {
        result.pop();
    }

    result
}
