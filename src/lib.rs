//! Parse `git diff` output into a structured model and render it.
//!
//! - [`scan`] turns a patch stream into a [`Diff`].
//! - [`highlight`] diffs a pair of changed lines character by character
//!   while keeping their syntax-highlighting markup well formed.
//! - [`excerpt`] reveals unchanged context between hunks.
//! - [`table`] diffs CSV files cell by cell.
//!
//! [`DiffRenderer`] bundles the options and collaborators these need.

use error_set::error_set;
use std::io::{BufRead, Read};

pub mod diff;
pub mod excerpt;
pub mod highlight;
pub mod scan;
pub mod table;

pub use diff::{Diff, DiffFile, DiffLine, DiffLineType, DiffSection, format_diff};
pub use excerpt::{ExcerptDirection, ExcerptError, ExcerptOptions, build_blob_excerpt_section};
pub use highlight::{Highlighter, InlineDiffOptions, PlainHighlighter};
pub use scan::{LfsLookup, NoLfs, ParseLimits, ParseOptions, PatchError, PatchScanner, parse_patch};
pub use table::{CsvDiffOptions, TableDiffSection, TableError, create_csv_diff};

error_set! {
    /// Top-level error for diff rendering operations
    GitDiffError := {
        PatchError(PatchError),
        ExcerptError(ExcerptError),
        TableError(TableError),
    }
}

/// Main interface for parsing and rendering diffs
///
/// # Examples
/// ```
/// # use gitdiff_render::{DiffRenderer, PlainHighlighter};
/// let patch = "diff --git a/a.rs b/a.rs
/// --- a/a.rs
/// +++ b/a.rs
/// @@ -1 +1 @@
/// -let x = 1;
/// +let x = 2;
/// ";
/// let renderer = DiffRenderer::new(&PlainHighlighter);
/// let diff = renderer.parse(patch.as_bytes()).unwrap();
/// let section = &diff.files[0].sections[0];
/// assert_eq!(
///     renderer.inline_html(section, 2, None).unwrap(),
///     r#"let x = <span class="added-code">2</span>;"#
/// );
/// ```
pub struct DiffRenderer<'a> {
    parse: ParseOptions,
    inline: InlineDiffOptions,
    csv: CsvDiffOptions,
    lfs: &'a dyn LfsLookup,
    highlighter: &'a dyn Highlighter,
}

impl<'a> DiffRenderer<'a> {
    /// Renderer with stock limits and no LFS store
    pub fn new(highlighter: &'a dyn Highlighter) -> Self {
        Self {
            parse: ParseOptions::default(),
            inline: InlineDiffOptions::default(),
            csv: CsvDiffOptions::default(),
            lfs: &NoLfs,
            highlighter,
        }
    }

    #[must_use]
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    #[must_use]
    pub fn with_inline_options(mut self, options: InlineDiffOptions) -> Self {
        self.inline = options;
        self
    }

    #[must_use]
    pub fn with_csv_options(mut self, options: CsvDiffOptions) -> Self {
        self.csv = options;
        self
    }

    #[must_use]
    pub fn with_lfs(mut self, lfs: &'a dyn LfsLookup) -> Self {
        self.lfs = lfs;
        self
    }

    /// Parse a patch stream
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<Diff, GitDiffError> {
        let mut diff = Diff::default();
        PatchScanner::new(self.parse.clone(), self.lfs).scan_into(reader, &mut diff)?;
        Ok(diff)
    }

    /// Reveal hidden context of `file_path`, read from `reader`
    pub fn excerpt<R: BufRead>(
        &self,
        file_path: &str,
        reader: R,
        options: &ExcerptOptions,
    ) -> Result<DiffSection, GitDiffError> {
        Ok(build_blob_excerpt_section(file_path, reader, options, self.highlighter)?)
    }

    /// Cell-level diff of a CSV file
    pub fn csv<B: Read, H: Read>(
        &self,
        file: &DiffFile,
        base: Option<B>,
        head: Option<H>,
    ) -> Result<Vec<TableDiffSection>, GitDiffError> {
        Ok(create_csv_diff(file, base, head, &self.csv)?)
    }

    /// Highlighted HTML of one line of `section`
    pub fn inline_html(&self, section: &DiffSection, index: usize, language: Option<&str>) -> Option<String> {
        section.inline_html(index, language, self.highlighter, &self.inline)
    }
}
