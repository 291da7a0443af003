use super::file::DiffFile;
use super::line::CodeComment;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Resolves the remote URL of a submodule at a given commit.
pub trait SubmoduleLookup {
    fn submodule_url(&self, commit: &str, path: &str) -> Option<String>;
}

impl<F> SubmoduleLookup for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn submodule_url(&self, commit: &str, path: &str) -> Option<String> {
        self(commit, path)
    }
}

/// Parsed result of one patch stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diff {
    pub files: Vec<DiffFile>,
    pub num_files: usize,
    pub total_addition: usize,
    pub total_deletion: usize,
    /// Set once the file limit was hit and the rest of the stream dropped
    pub is_incomplete: bool,
    /// File parsing started from, when files were skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// First file left out by the file limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Diff {
    /// Find a file by its current name
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&DiffFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Attach review comments to the lines they point at.
    ///
    /// Comments are keyed by file name; a comment whose anchor is not shown
    /// in the diff is dropped. Each line's comments end up ordered by
    /// creation time.
    pub fn attach_comments(&mut self, mut comments: HashMap<String, Vec<CodeComment>>) {
        for file in &mut self.files {
            let Some(mut pending) = comments.remove(&file.name) else {
                continue;
            };
            pending.sort_by_key(|c| c.created_unix);

            for line in file.sections.iter_mut().flat_map(|s| s.lines.iter_mut()) {
                let Some(anchor) = line.comment_anchor() else {
                    continue;
                };
                let (hits, rest): (Vec<_>, Vec<_>) =
                    pending.into_iter().partition(|c| c.line == anchor);
                line.comments.extend(hits);
                pending = rest;
            }

            if !pending.is_empty() {
                debug!(file = %file.name, dropped = pending.len(), "comments outside the diff");
            }
        }
    }

    /// Fill `submodule_url` for every submodule entry.
    pub fn resolve_submodules(&mut self, commit: &str, lookup: &dyn SubmoduleLookup) {
        for file in self.files.iter_mut().filter(|f| f.is_submodule) {
            file.submodule_url = lookup.submodule_url(commit, &file.name);
            if file.submodule_url.is_none() {
                debug!(file = %file.name, commit, "submodule url not found");
            }
        }
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write!(f, "{file}")?;
        }
        Ok(())
    }
}
