//! Streaming scanner for `git diff` output.
//!
//! The scanner reads a patch line by line and builds a [`Diff`]. Each file
//! goes through three states: the `diff --git` line, its extended headers
//! (`new file mode`, `rename from`, `index`, ...), and finally its hunks once
//! the `+++` line is seen.
//!
//! Three caps bound the work done on hostile or simply huge patches; see
//! [`ParseLimits`]. Hitting one is not an error: the affected file (or the
//! whole diff) is flagged incomplete instead.
//!
//! # Examples
//!
//! ```
//! use gitdiff_render::scan::{ParseLimits, parse_patch};
//!
//! let patch = "diff --git a/hello.txt b/hello.txt
//! --- a/hello.txt
//! +++ b/hello.txt
//! @@ -1 +1 @@
//! -hello
//! +hello, world
//! ";
//! let diff = parse_patch(ParseLimits::default(), patch.as_bytes()).unwrap();
//! assert_eq!(diff.num_files, 1);
//! assert_eq!(diff.files[0].addition, 1);
//! assert_eq!(diff.files[0].sections[0].lines[2].content, "+hello, world");
//! ```

mod charset;
mod header;
mod hunks;
mod lfs;
pub(crate) mod reader;

pub use lfs::{LFS_OID_PREFIX, LFS_POINTER_IDENTIFIER, LfsLookup, NoLfs};

use crate::diff::{Diff, DiffFile, DiffFileType};
use charset::UndecodedLines;
use error_set::error_set;
use hunks::HunkScanner;
use reader::{LineReader, RawLine};
use std::io::BufRead;
use tracing::debug;

error_set! {
    /// Errors raised while scanning a patch
    PatchError := {
        #[display("invalid first file line: {line}")]
        InvalidFileHeader { line: String },
        #[display("invalid hunk header: {line}")]
        InvalidHunkHeader { line: String },
        #[display("unexpected line in hunk: {line}")]
        UnexpectedHunkLine { line: String },
        #[display("unexpected no-newline marker: {line}")]
        InvalidNoNewlineMarker { line: String },
        #[display("line number out of range: {line}")]
        LineNumberOverflow { line: String },
        IoError(std::io::Error),
    }
}

/// Prefix of the line that opens every file in a git patch.
pub const DIFF_HEAD: &str = "diff --git ";

/// Caps on how much of a patch gets modeled. `None` disables a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Hunk lines kept per file
    pub max_lines: Option<usize>,
    /// Bytes kept per hunk line, marker included
    pub max_line_characters: Option<usize>,
    /// Files modeled before the rest of the stream is discarded
    pub max_files: Option<usize>,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_lines: Some(1000),
            max_line_characters: Some(5000),
            max_files: Some(100),
        }
    }
}

impl ParseLimits {
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_lines: None,
            max_line_characters: None,
            max_files: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub limits: ParseLimits,
    /// Skip every file before the one with this name
    pub skip_to: Option<String>,
}

/// Parses patches into a caller-owned [`Diff`].
///
/// Keeping the output outside the scanner means whatever was parsed before
/// an error is still available to the caller.
pub struct PatchScanner<'a> {
    options: ParseOptions,
    lfs: &'a dyn LfsLookup,
}

impl<'a> PatchScanner<'a> {
    pub fn new(options: ParseOptions, lfs: &'a dyn LfsLookup) -> Self {
        Self { options, lfs }
    }

    /// Scan `reader` and append its files to `diff`.
    ///
    /// Totals and `num_files` are refreshed and the encoding pass runs even
    /// when an error cuts the scan short.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] for malformed headers or hunk lines and for
    /// read failures.
    pub fn scan_into<R: BufRead>(&self, reader: R, diff: &mut Diff) -> Result<(), PatchError> {
        debug!(
            limits = ?self.options.limits,
            skip_to = ?self.options.skip_to,
            "parsing patch"
        );
        let mut input = LineReader::new(reader);
        let mut undecoded = UndecodedLines::default();

        let result = self.scan_files(&mut input, &mut undecoded, diff);

        undecoded.apply(&mut diff.files);
        diff.num_files = diff.files.len();
        diff.total_addition = diff.files.iter().map(|f| f.addition).sum();
        diff.total_deletion = diff.files.iter().map(|f| f.deletion).sum();
        debug!(
            files = diff.num_files,
            incomplete = diff.is_incomplete,
            ok = result.is_ok(),
            "patch parsed"
        );
        result
    }

    fn scan_files<R: BufRead>(
        &self,
        input: &mut LineReader<R>,
        undecoded: &mut UndecodedLines,
        diff: &mut Diff,
    ) -> Result<(), PatchError> {
        let limits = self.options.limits;
        let mut skip_to = self.options.skip_to.as_deref();

        let Some(mut line) = input.read_line(None)? else {
            return Ok(());
        };

        loop {
            let text = line.text();
            let Some(args) = text.strip_prefix(DIFF_HEAD) else {
                return Err(PatchError::InvalidFileHeader { line: text });
            };
            let names = header::parse_diff_names(args);

            if limits.max_files.is_some_and(|max| diff.files.len() >= max) {
                diff.end = Some(names.name);
                diff.is_incomplete = true;
                let dropped = input.drain()?;
                debug!(dropped, "file limit reached, rest of patch discarded");
                return Ok(());
            }

            if let Some(target) = skip_to {
                if names.name != target {
                    match input.skip_to_prefix(DIFF_HEAD.as_bytes())? {
                        Some(next) => {
                            line = next;
                            continue;
                        }
                        None => return Ok(()),
                    }
                }
                diff.start = Some(target.to_string());
                skip_to = None;
            }

            let mut file = DiffFile {
                name: names.name,
                old_name: names.old_name,
                index: diff.files.len() + 1,
                is_ambiguous: names.ambiguous,
                ..DiffFile::default()
            };
            let result = self.scan_file(input, undecoded, &mut file, diff.files.len());
            file.is_renamed |= file.name != file.old_name;
            if file.is_incomplete {
                debug!(file = %file.name, "file truncated by limits");
            }
            diff.files.push(file);

            match result? {
                Some(next) => line = next,
                None => return Ok(()),
            }
        }
    }

    /// Consume one file's extended headers and hunks.
    ///
    /// Returns the `diff --git` line of the next file, if any.
    fn scan_file<R: BufRead>(
        &self,
        input: &mut LineReader<R>,
        undecoded: &mut UndecodedLines,
        file: &mut DiffFile,
        file_idx: usize,
    ) -> Result<Option<RawLine>, PatchError> {
        loop {
            let Some(line) = input.read_line(None)? else {
                return Ok(None);
            };
            let text = line.text();

            if text.starts_with(DIFF_HEAD) {
                return Ok(Some(line));
            } else if text.starts_with("old mode ") || text.starts_with("new mode ") {
                file.is_submodule |= is_gitlink(&text);
            } else if let Some(from) = text.strip_prefix("rename from ") {
                file.is_renamed = true;
                file.kind = DiffFileType::Rename;
                if file.is_ambiguous {
                    file.old_name = from.to_string();
                }
            } else if let Some(to) = text.strip_prefix("rename to ") {
                file.is_renamed = true;
                file.kind = DiffFileType::Rename;
                if file.is_ambiguous {
                    file.name = to.to_string();
                    file.is_ambiguous = false;
                }
            } else if let Some(from) = text.strip_prefix("copy from ") {
                file.is_renamed = true;
                file.kind = DiffFileType::Copy;
                if file.is_ambiguous {
                    file.old_name = from.to_string();
                }
            } else if let Some(to) = text.strip_prefix("copy to ") {
                file.is_renamed = true;
                file.kind = DiffFileType::Copy;
                if file.is_ambiguous {
                    file.name = to.to_string();
                    file.is_ambiguous = false;
                }
            } else if text.starts_with("new file") {
                file.kind = DiffFileType::Add;
                file.is_created = true;
                file.is_submodule |= is_gitlink(&text);
            } else if text.starts_with("deleted") {
                file.kind = DiffFileType::Delete;
                file.is_deleted = true;
                file.is_submodule |= is_gitlink(&text);
            } else if text.starts_with("index") {
                file.is_submodule |= is_gitlink(&text);
            } else if text.starts_with("similarity index 100%") {
                file.kind = DiffFileType::Rename;
                file.is_renamed = true;
            } else if text.starts_with("Binary") {
                file.is_bin = true;
            } else if text.starts_with("--- ") {
                if file.is_ambiguous {
                    file.old_name = header::unified_header_name(&text, b'a').unwrap_or_default();
                }
            } else if text.starts_with("+++ ") {
                if file.is_ambiguous {
                    match header::unified_header_name(&text, b'b') {
                        Some(name) => {
                            if file.old_name.is_empty() {
                                file.old_name.clone_from(&name);
                            }
                            file.name = name;
                        }
                        None => file.name.clone_from(&file.old_name),
                    }
                    file.is_ambiguous = false;
                }
                return HunkScanner::new(self.options.limits, self.lfs, file, file_idx, undecoded)
                    .run(input);
            }
        }
    }
}

/// Whether a mode/index header names a submodule entry
fn is_gitlink(line: &str) -> bool {
    line.ends_with(" 160000")
}

/// Parse a patch with no LFS store and no skipping.
///
/// # Errors
///
/// See [`PatchScanner::scan_into`]; the partial result is dropped.
pub fn parse_patch<R: BufRead>(limits: ParseLimits, reader: R) -> Result<Diff, PatchError> {
    let options = ParseOptions {
        limits,
        skip_to: None,
    };
    let mut diff = Diff::default();
    PatchScanner::new(options, &NoLfs).scan_into(reader, &mut diff)?;
    Ok(diff)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::DiffLineType;
    use similar_asserts::assert_eq;

    const OID: &str = "5f6d2e1c0b9a8f7e6d5c4b3a29180f7e6d5c4b3a29180f7e6d5c4b3a29180f7e";

    fn parse(input: &str) -> Diff {
        parse_patch(ParseLimits::unlimited(), input.as_bytes()).unwrap()
    }

    fn two_files() -> String {
        "diff --git a/one.txt b/one.txt
--- a/one.txt
+++ b/one.txt
@@ -1 +1 @@
-a
+b
diff --git a/two.txt b/two.txt
--- a/two.txt
+++ b/two.txt
@@ -1,2 +1,3 @@
 x
+y
 z
"
        .to_string()
    }

    #[test]
    fn line_numbers_follow_hunk_headers() {
        let diff = parse(
            "diff --git a/src/main.rs b/src/main.rs
index 1111111..2222222 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -3,3 +3,4 @@ fn main() {
 let a = 1;
-let b = 2;
+let b = 3;
+let c = 4;
 }
@@ -20,2 +21,2 @@
 tail
-old
+new
",
        );
        let file = &diff.files[0];
        assert_eq!(file.kind, DiffFileType::Change);
        assert_eq!((file.addition, file.deletion), (3, 2));
        assert_eq!(file.sections.len(), 2);

        let numbers: Vec<_> = file.sections[0]
            .lines
            .iter()
            .map(|l| (l.kind, l.left(), l.right()))
            .collect();
        assert_eq!(
            numbers,
            vec![
                (DiffLineType::Section, 0, 0),
                (DiffLineType::Plain, 3, 3),
                (DiffLineType::Del, 4, 0),
                (DiffLineType::Add, 0, 4),
                (DiffLineType::Add, 0, 5),
                (DiffLineType::Plain, 5, 6),
            ]
        );

        let info = file.sections[1].lines[0].section_info.clone().unwrap();
        assert_eq!((info.last_left_idx, info.last_right_idx), (5, 6));
        assert_eq!((info.left_idx, info.right_idx), (20, 21));
        assert_eq!(file.sections[1].lines[2].left(), 21);
    }

    #[test]
    fn deletions_pair_with_following_additions() {
        let diff = parse(
            "diff --git a/p.txt b/p.txt
--- a/p.txt
+++ b/p.txt
@@ -1,2 +1,2 @@
-a
-b
+c
+d
",
        );
        let lines = &diff.files[0].sections[0].lines;
        let matched: Vec<_> = lines.iter().map(|l| l.matched).collect();
        assert_eq!(matched, vec![None, Some(3), Some(4), Some(1), Some(2)]);
    }

    #[test]
    fn new_deleted_and_copied_files() {
        let diff = parse(
            "diff --git a/new.txt b/new.txt
new file mode 100644
index 0000000..1111111
--- /dev/null
+++ b/new.txt
@@ -0,0 +1 @@
+hello
diff --git a/old.txt b/old.txt
deleted file mode 100644
index 1111111..0000000
--- a/old.txt
+++ /dev/null
@@ -1 +0,0 @@
-bye
diff --git a/src.txt b/dst.txt
similarity index 90%
copy from src.txt
copy to dst.txt
",
        );
        assert_eq!(diff.files.len(), 3);
        let (added, deleted, copied) = (&diff.files[0], &diff.files[1], &diff.files[2]);
        assert_eq!(added.kind, DiffFileType::Add);
        assert!(added.is_created);
        assert_eq!(added.old_name, "new.txt");
        assert_eq!(deleted.kind, DiffFileType::Delete);
        assert!(deleted.is_deleted);
        assert_eq!(deleted.name, "old.txt");
        assert_eq!(copied.kind, DiffFileType::Copy);
        assert_eq!((copied.old_name.as_str(), copied.name.as_str()), ("src.txt", "dst.txt"));
        assert!(copied.is_renamed);
        assert!(copied.sections.is_empty());
        assert_eq!((diff.total_addition, diff.total_deletion), (1, 1));
        assert_eq!(diff.files.iter().map(|f| f.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn binary_and_submodule_entries() {
        let diff = parse(
            "diff --git a/logo.png b/logo.png
index 1111111..2222222 100644
Binary files a/logo.png and b/logo.png differ
diff --git a/vendor/lib b/vendor/lib
new file mode 160000
index 0000000..3333333
--- /dev/null
+++ b/vendor/lib
@@ -0,0 +1 @@
+Subproject commit 3333333333333333333333333333333333333333
",
        );
        assert!(diff.files[0].is_bin);
        assert!(diff.files[0].sections.is_empty());
        assert!(!diff.files[0].is_submodule);
        assert!(diff.files[1].is_submodule);
        assert_eq!(diff.files[1].addition, 1);
    }

    #[test]
    fn file_limit_drops_the_rest() {
        let limits = ParseLimits {
            max_files: Some(1),
            ..ParseLimits::unlimited()
        };
        let diff = parse_patch(limits, two_files().as_bytes()).unwrap();
        assert_eq!(diff.num_files, 1);
        assert!(diff.is_incomplete);
        assert_eq!(diff.end.as_deref(), Some("two.txt"));
        assert_eq!(diff.total_addition, 1);
    }

    #[test]
    fn skip_to_starts_at_named_file() {
        let options = ParseOptions {
            limits: ParseLimits::unlimited(),
            skip_to: Some("two.txt".to_string()),
        };
        let mut diff = Diff::default();
        PatchScanner::new(options, &NoLfs)
            .scan_into(two_files().as_bytes(), &mut diff)
            .unwrap();
        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].name, "two.txt");
        assert_eq!(diff.files[0].index, 1);
        assert_eq!(diff.start.as_deref(), Some("two.txt"));
    }

    #[test]
    fn skip_to_missing_file_yields_nothing() {
        let options = ParseOptions {
            limits: ParseLimits::unlimited(),
            skip_to: Some("absent.txt".to_string()),
        };
        let mut diff = Diff::default();
        PatchScanner::new(options, &NoLfs)
            .scan_into(two_files().as_bytes(), &mut diff)
            .unwrap();
        assert!(diff.files.is_empty());
        assert_eq!(diff.start, None);
    }

    #[test]
    fn line_limit_keeps_counting() {
        let limits = ParseLimits {
            max_lines: Some(2),
            ..ParseLimits::unlimited()
        };
        let patch = "diff --git a/n.txt b/n.txt
--- a/n.txt
+++ b/n.txt
@@ -1 +1,4 @@
-0
+1
+2
+3
+4
";
        let diff = parse_patch(limits, patch.as_bytes()).unwrap();
        let file = &diff.files[0];
        assert!(file.is_incomplete);
        assert!(!file.is_incomplete_line_too_long);
        assert_eq!((file.addition, file.deletion), (4, 1));
        assert_eq!(file.sections[0].lines.len(), 3);
    }

    #[test]
    fn long_lines_are_cut_on_char_boundaries() {
        let limits = ParseLimits {
            max_line_characters: Some(4),
            ..ParseLimits::unlimited()
        };
        let patch = "diff --git a/u.txt b/u.txt
--- a/u.txt
+++ b/u.txt
@@ -0,0 +1 @@
+abé and more
";
        let diff = parse_patch(limits, patch.as_bytes()).unwrap();
        let file = &diff.files[0];
        assert!(file.is_incomplete_line_too_long);
        assert_eq!(file.sections[0].lines[0].content, "@@ -0,0 +1 @@");
        assert_eq!(file.sections[0].lines[1].content, "+ab");
    }

    #[test]
    fn tiny_line_limits_keep_markers_and_kinds() {
        let patch = "diff --git a/n.txt b/n.txt
--- a/n.txt
+++ b/n.txt
@@ -1 +1 @@
-a
\\ No newline at end of file
+b
";
        let limits = ParseLimits {
            max_line_characters: Some(10),
            ..ParseLimits::unlimited()
        };
        let diff = parse_patch(limits, patch.as_bytes()).unwrap();
        let file = &diff.files[0];
        assert!(!file.is_incomplete);
        let contents: Vec<_> = file.lines().map(|l| l.content.as_str()).collect();
        assert_eq!(contents, ["@@ -1 +1 @@", "-a", "+b"]);

        let limits = ParseLimits {
            max_line_characters: Some(0),
            ..ParseLimits::unlimited()
        };
        let diff = parse_patch(limits, patch.as_bytes()).unwrap();
        let file = &diff.files[0];
        assert!(file.is_incomplete_line_too_long);
        let kinds: Vec<_> = file.lines().map(|l| (l.kind, l.content.as_str())).collect();
        assert_eq!(
            kinds,
            [
                (DiffLineType::Section, "@@ -1 +1 @@"),
                (DiffLineType::Del, "-"),
                (DiffLineType::Add, "+"),
            ]
        );
    }

    #[test]
    fn marker_after_the_last_kept_line() {
        let patch = "diff --git a/n.txt b/n.txt
--- a/n.txt
+++ b/n.txt
@@ -1 +1 @@
-a
+b
\\ No newline at end of file
";
        let exact = ParseLimits {
            max_lines: Some(2),
            ..ParseLimits::unlimited()
        };
        let file = &parse_patch(exact, patch.as_bytes()).unwrap().files[0];
        assert!(!file.is_incomplete);
        assert_eq!(file.sections[0].lines.len(), 3);

        let short = ParseLimits {
            max_lines: Some(1),
            ..ParseLimits::unlimited()
        };
        let file = &parse_patch(short, patch.as_bytes()).unwrap().files[0];
        assert!(file.is_incomplete);
        assert_eq!(file.sections[0].lines.len(), 2);
    }

    #[test]
    fn line_numbers_stop_at_the_top_of_the_range() {
        let at_max = "diff --git a/n.txt b/n.txt\n--- a/n.txt\n+++ b/n.txt\n@@ -1 +4294967294 @@\n+x\n";
        let diff = parse(at_max);
        assert_eq!(diff.files[0].sections[0].lines[1].right(), u32::MAX - 1);

        let past_max = at_max.replace("+4294967294", "+4294967295");
        let err = parse_patch(ParseLimits::unlimited(), past_max.as_bytes()).unwrap_err();
        assert!(matches!(err, PatchError::LineNumberOverflow { .. }));

        let context = "diff --git a/n.txt b/n.txt\n--- a/n.txt\n+++ b/n.txt\n@@ -4294967295 +1 @@\n x\n";
        let err = parse_patch(ParseLimits::unlimited(), context.as_bytes()).unwrap_err();
        assert!(matches!(err, PatchError::LineNumberOverflow { .. }));
    }

    #[test]
    fn lfs_pointer_sections_are_emptied() {
        let patch = format!(
            "diff --git a/big.bin b/big.bin
new file mode 100644
--- /dev/null
+++ b/big.bin
@@ -0,0 +1,3 @@
+{LFS_POINTER_IDENTIFIER}
+{LFS_OID_PREFIX}{OID}
+size 12345
"
        );
        let tracked = |oid: &str| oid == OID;
        let mut diff = Diff::default();
        PatchScanner::new(ParseOptions::default(), &tracked)
            .scan_into(patch.as_bytes(), &mut diff)
            .unwrap();
        let file = &diff.files[0];
        assert!(file.is_lfs_file);
        assert!(file.is_bin);
        assert_eq!(file.sections.len(), 1);
        assert!(file.sections[0].lines.is_empty());

        let untracked = parse(&patch);
        assert!(!untracked.files[0].is_lfs_file);
        assert_eq!(untracked.files[0].sections[0].lines.len(), 4);
    }

    #[test]
    fn latin1_hunk_lines_are_decoded() {
        let mut patch = b"diff --git a/menu.txt b/menu.txt
--- a/menu.txt
+++ b/menu.txt
@@ -0,0 +1 @@
+"
        .to_vec();
        patch.extend_from_slice(b"caf\xe9 cr\xe8me br\xfbl\xe9e, na\xefve fa\xe7ade\n");
        let diff = parse_patch(ParseLimits::unlimited(), patch.as_slice()).unwrap();
        assert_eq!(
            diff.files[0].sections[0].lines[1].content,
            "+café crème brûlée, naïve façade"
        );
    }

    #[test]
    fn malformed_input_is_reported() {
        let err = parse_patch(ParseLimits::default(), "not a patch\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PatchError::InvalidFileHeader { .. }));

        let bad_hunk = "diff --git a/a b/a\n--- a/a\n+++ b/a\n@@ nonsense @@\n";
        let err = parse_patch(ParseLimits::default(), bad_hunk.as_bytes()).unwrap_err();
        assert!(matches!(err, PatchError::InvalidHunkHeader { .. }));

        let bad_marker = "diff --git a/a b/a\n--- a/a\n+++ b/a\n@@ -1 +1 @@\n-a\n\\ nope\n";
        let err = parse_patch(ParseLimits::default(), bad_marker.as_bytes()).unwrap_err();
        assert!(matches!(err, PatchError::InvalidNoNewlineMarker { .. }));
    }

    #[test]
    fn partial_result_survives_an_error() {
        let patch = format!(
            "{}diff --git a/three b/three\n--- a/three\n+++ b/three\n@@ -1 +1 @@\n?what\n",
            two_files()
        );
        let mut diff = Diff::default();
        let err = PatchScanner::new(ParseOptions::default(), &NoLfs)
            .scan_into(patch.as_bytes(), &mut diff)
            .unwrap_err();
        assert!(matches!(err, PatchError::UnexpectedHunkLine { .. }));
        assert_eq!(diff.num_files, 3);
        assert_eq!((diff.total_addition, diff.total_deletion), (2, 1));
    }

    #[test]
    fn empty_input_is_an_empty_diff() {
        assert_eq!(parse(""), Diff::default());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn hunk_line() -> impl Strategy<Value = String> {
            (prop_oneof![Just('+'), Just('-'), Just(' ')], "[a-z0-9 ]{0,12}")
                .prop_map(|(marker, text)| format!("{marker}{text}"))
        }

        fn patch(files: &[Vec<String>]) -> String {
            let mut out = String::new();
            for (i, lines) in files.iter().enumerate() {
                let old = lines.iter().filter(|l| !l.starts_with('+')).count();
                let new = lines.iter().filter(|l| !l.starts_with('-')).count();
                out.push_str(&format!(
                    "diff --git a/f{i}.txt b/f{i}.txt\n--- a/f{i}.txt\n+++ b/f{i}.txt\n@@ -1,{old} +1,{new} @@\n"
                ));
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            out
        }

        proptest! {
            #[test]
            fn counts_match_markers(files in prop::collection::vec(prop::collection::vec(hunk_line(), 1..12), 1..5)) {
                let diff = parse(&patch(&files));
                prop_assert_eq!(diff.num_files, files.len());
                for (file, lines) in diff.files.iter().zip(&files) {
                    prop_assert_eq!(file.addition, lines.iter().filter(|l| l.starts_with('+')).count());
                    prop_assert_eq!(file.deletion, lines.iter().filter(|l| l.starts_with('-')).count());
                }
                prop_assert_eq!(diff.total_addition, diff.files.iter().map(|f| f.addition).sum::<usize>());
            }

            #[test]
            fn display_reparses_to_same_model(files in prop::collection::vec(prop::collection::vec(hunk_line(), 1..12), 1..5)) {
                let diff = parse(&patch(&files));
                let again = parse(&diff.to_string());
                prop_assert_eq!(again, diff);
            }

            #[test]
            fn line_character_limit_never_fails(
                lines in prop::collection::vec(hunk_line(), 1..20),
                max in 0usize..16,
            ) {
                let text = patch(std::slice::from_ref(&lines));
                let full = parse(&text);
                let limits = ParseLimits { max_line_characters: Some(max), ..ParseLimits::unlimited() };
                let cut = parse_patch(limits, text.as_bytes()).unwrap();

                let (full, cut) = (&full.files[0], &cut.files[0]);
                prop_assert_eq!(cut.lines().count(), full.lines().count());
                for (c, f) in cut.lines().zip(full.lines()) {
                    prop_assert_eq!(c.kind, f.kind);
                    prop_assert!(f.content.starts_with(&c.content));
                }
            }

            #[test]
            fn line_limit_only_truncates(
                lines in prop::collection::vec(hunk_line(), 1..30),
                max in 0usize..30,
            ) {
                let text = patch(std::slice::from_ref(&lines));
                let full = parse(&text);
                let limits = ParseLimits { max_lines: Some(max), ..ParseLimits::unlimited() };
                let cut = parse_patch(limits, text.as_bytes()).unwrap();

                let (full, cut) = (&full.files[0], &cut.files[0]);
                prop_assert_eq!((cut.addition, cut.deletion), (full.addition, full.deletion));
                prop_assert_eq!(cut.is_incomplete, lines.len() > max);
                let shape = |l: &crate::diff::DiffLine| (l.kind, l.left(), l.right(), l.content.clone());
                let kept: Vec<_> = cut.lines().filter(|l| l.kind != DiffLineType::Section).map(shape).collect();
                prop_assert_eq!(kept.len(), lines.len().min(max));
                let expected: Vec<_> = full
                    .lines()
                    .filter(|l| l.kind != DiffLineType::Section)
                    .take(max)
                    .map(shape)
                    .collect();
                prop_assert_eq!(kept, expected);
            }
        }
    }
}
