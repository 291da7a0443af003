#![allow(clippy::unwrap_used)]

use gitdiff_render::diff::{CommentSide, DiffFileType, DiffLine, DiffLineType, SectionInfo};
use gitdiff_render::scan::{NoLfs, ParseLimits, ParseOptions, PatchScanner, parse_patch};
use gitdiff_render::{Diff, DiffFile};
use similar_asserts::assert_eq;

const README_HUNK: &str = "@@ -1,3 +1,6 @@
 # repo-migrator
+
+ Build Status
- Latest Release
 Docker Pulls
+ cut off
+ cut off";

fn quoted_readme() -> String {
    format!(
        "diff --git \"\\\\a/README.md\" \"\\\\b/README.md\"
--- \"\\\\a/README.md\"
+++ \"\\\\b/README.md\"
{README_HUNK}
"
    )
}

fn backslash_file() -> String {
    format!(
        "diff --git \"a/A \\\\ B\" \"b/A \\\\ B\"
--- \"a/A \\\\ B\"
+++ \"b/A \\\\ B\"
{README_HUNK}
"
    )
}

fn single_file(patch: &str) -> DiffFile {
    let diff = parse_patch(ParseLimits::default(), patch.as_bytes()).unwrap();
    assert_eq!(diff.files.len(), 1, "{diff:#?}");
    diff.files.into_iter().next().unwrap()
}

fn assert_file(file: &DiffFile, old_name: &str, name: &str, addition: usize, deletion: usize) {
    assert_eq!(file.old_name, old_name);
    assert_eq!(file.name, name);
    assert_eq!((file.addition, file.deletion), (addition, deletion));
}

fn skip_to(patch: &str, target: &str) -> Diff {
    let options = ParseOptions {
        skip_to: Some(target.to_string()),
        ..ParseOptions::default()
    };
    let mut diff = Diff::default();
    PatchScanner::new(options, &NoLfs)
        .scan_into(patch.as_bytes(), &mut diff)
        .unwrap();
    diff
}

#[test]
fn skip_to_later_file() {
    let diff = skip_to(&format!("{}{}", backslash_file(), quoted_readme()), "README.md");
    assert_eq!(diff.files.len(), 1);
    assert_file(&diff.files[0], "README.md", "README.md", 4, 1);
}

#[test]
fn skip_to_first_file_still_reads_it() {
    let diff = skip_to(&backslash_file(), "A \\ B");
    assert_eq!(diff.files.len(), 1);
    assert_file(&diff.files[0], "A \\ B", "A \\ B", 4, 1);
}

#[test]
fn skip_to_stops_before_repeated_names() {
    let patch = format!("{}{}{}", backslash_file(), backslash_file(), quoted_readme());
    let diff = skip_to(&patch, "README.md");
    assert_eq!(diff.files.len(), 1);
    assert_file(&diff.files[0], "README.md", "README.md", 4, 1);
}

#[test]
fn quoted_names_with_escaped_prefix() {
    assert_file(&single_file(&quoted_readme()), "README.md", "README.md", 4, 1);
}

#[test]
fn quoted_names_with_backslash() {
    assert_file(&single_file(&backslash_file()), "A \\ B", "A \\ B", 4, 1);
}

#[test]
fn really_weird_filename() {
    let patch = "diff --git \"\\\\a/a b/file b/a a/file\" \"\\\\b/a b/file b/a a/file\"
index d2186f1..f5c8ed2 100644
--- \"\\\\a/a b/file b/a a/file\"\t
+++ \"\\\\b/a b/file b/a a/file\"\t
@@ -1,3 +1,2 @@
 Create a weird file.
\x20
-and what does diff do here?
\\ No newline at end of file";
    let file = single_file(patch);
    assert_file(&file, "a b/file b/a a/file", "a b/file b/a a/file", 0, 1);
    assert!(!file.is_renamed);
}

#[test]
fn delete_file_with_blanks() {
    let patch = "diff --git \"\\\\a/file with blanks\" \"\\\\b/file with blanks\"
deleted file mode 100644
index 898651a..0000000
--- \"\\\\a/file with blanks\"\x20
+++ /dev/null
@@ -1,5 +0,0 @@
-a blank file
-
-has a couple o line
-
-the 5th line is the last
";
    let file = single_file(patch);
    assert_file(&file, "file with blanks", "file with blanks", 0, 5);
    assert_eq!(file.kind, DiffFileType::Delete);
}

#[test]
fn rename_with_octal_escapes() {
    let patch = r#"diff --git "a/\360\243\220\265b\342\200\240vs" "b/a\342\200\224as"
similarity index 100%
rename from "\360\243\220\265b\342\200\240vs"
rename to "a\342\200\224as"
"#;
    let file = single_file(patch);
    assert_file(&file, "𣐵b†vs", "a—as", 0, 0);
    assert_eq!(file.kind, DiffFileType::Rename);
    assert!(file.is_renamed);
}

#[test]
fn rename_with_spaces() {
    let patch = "diff --git \"\\\\a/a b/file b/a a/file\" \"\\\\b/a b/a a/file b/b file\"
similarity index 100%
rename from a b/file b/a a/file
rename to a b/a a/file b/b file
";
    assert_file(
        &single_file(patch),
        "a b/file b/a a/file",
        "a b/a a/file b/b file",
        0,
        0,
    );
}

#[test]
fn ambiguous_deleted() {
    let patch = "diff --git a/b b/b b/b b/b
deleted file mode 100644
index 92e798b..0000000
--- a/b b/b\t
+++ /dev/null
@@ -1 +0,0 @@
-b b/b
";
    let file = single_file(patch);
    assert_file(&file, "b b/b", "b b/b", 0, 1);
    assert!(!file.is_ambiguous);
}

#[test]
fn ambiguous_addition() {
    let patch = "diff --git a/b b/b b/b b/b
new file mode 100644
index 0000000..92e798b
--- /dev/null
+++ b/b b/b\t
@@ -0,0 +1 @@
+b b/b
";
    let file = single_file(patch);
    assert_file(&file, "b b/b", "b b/b", 1, 0);
    assert_eq!(file.kind, DiffFileType::Add);
}

#[test]
fn ambiguous_rename_settled_by_rename_lines() {
    let patch = "diff --git a/b b/b b/b b/b b/b b/b
similarity index 100%
rename from b b/b b/b b/b b/b
rename to b
";
    assert_file(&single_file(patch), "b b/b b/b b/b b/b", "b", 0, 0);

    let patch = "diff --git a/b b/b b/b b/b b/b b/b
similarity index 100%
rename from b b/b b/b b/b
rename to b b/b
";
    assert_file(&single_file(patch), "b b/b b/b b/b", "b b/b", 0, 0);
}

#[test]
fn header_lookalikes_inside_hunks() {
    let patch = "diff --git a/minuses-and-pluses b/minuses-and-pluses
index 6961180..9ba1a00 100644
--- a/minuses-and-pluses
+++ b/minuses-and-pluses
@@ -1,4 +1,4 @@
--- 1st line
-++ 2nd line
--- 3rd line
-++ 4th line
+++ 1st line
+-- 2nd line
+++ 3rd line
+-- 4th line
";
    let file = single_file(patch);
    assert_file(&file, "minuses-and-pluses", "minuses-and-pluses", 4, 4);
    assert_eq!(file.sections[0].lines[1].text(), "-- 1st line");
}

fn new_file_with_lines(count: usize) -> String {
    let mut patch = "diff --git a/newfile2 b/newfile2
new file mode 100644
index 0000000..6bb8f39
--- /dev/null
+++ b/newfile2
@@ -0,0 +1,35 @@
"
    .to_string();
    for i in 0..count {
        patch.push_str(&format!("+line{i}\n"));
    }
    patch
}

fn limits(max_lines: usize, max_line_characters: usize) -> ParseLimits {
    ParseLimits {
        max_lines: Some(max_lines),
        max_line_characters: Some(max_line_characters),
        ..ParseLimits::default()
    }
}

#[test]
fn line_limit_marks_file_incomplete() {
    let patch = new_file_with_lines(35);

    let diff = parse_patch(limits(20, 5000), patch.as_bytes()).unwrap();
    assert!(diff.files[0].is_incomplete);

    let diff = parse_patch(limits(40, 5000), patch.as_bytes()).unwrap();
    assert!(!diff.files[0].is_incomplete);

    let diff = parse_patch(limits(40, 5), patch.as_bytes()).unwrap();
    assert!(diff.files[0].is_incomplete);
    assert!(diff.files[0].is_incomplete_line_too_long);
}

#[test]
fn overlong_line_marks_file_incomplete() {
    let mut patch = new_file_with_lines(33);
    patch.push_str("+line33");
    patch.push_str(&"0123456789ABCDEF".repeat(512));
    patch.push_str("\n+line34\n+line35\n");

    for max_lines in [20, 40] {
        let diff = parse_patch(limits(max_lines, 4096), patch.as_bytes()).unwrap();
        assert!(diff.files[0].is_incomplete);
    }

    let diff = parse_patch(limits(40, 4096), patch.as_bytes()).unwrap();
    let lines = &diff.files[0].sections[0].lines;
    assert_eq!(lines.len(), 37);
    assert_eq!(lines[34].content.len(), 4096);
    assert_eq!(lines[35].content, "+line34");
}

#[test]
fn accepted_header_variants() {
    let quoted_unquoted = format!(
        "diff --git \"a/README.md\" \"b/README.md\"\n--- a/README.md\n+++ b/README.md\n{README_HUNK}"
    );
    let mixed = format!(
        "diff --git \"a/A \\\\ B\" b/A/B\n--- \"a/A \\\\ B\"\n+++ b/A/B\n{README_HUNK}"
    );
    let plain = format!("diff --git a/README.md b/README.md\n--- a/README.md\n+++ b/README.md\n{README_HUNK}");

    for patch in [quoted_unquoted, backslash_file(), mixed, plain] {
        let diff = parse_patch(ParseLimits::default(), patch.as_bytes()).unwrap();
        assert_eq!(diff.files[0].addition, 4);
    }
}

#[test]
fn malformed_headers_do_not_panic() {
    for patch in ["diff --git \n--- a\t\n", "diff --git \"0\n"] {
        let _ = parse_patch(ParseLimits::default(), patch.as_bytes());
    }
}

#[test]
fn file_limit_drains_the_stream() {
    let patch = format!("{}{}", backslash_file(), quoted_readme());
    let limits = ParseLimits {
        max_files: Some(1),
        ..ParseLimits::default()
    };
    let diff = parse_patch(limits, patch.as_bytes()).unwrap();
    assert_eq!(diff.num_files, 1);
    assert!(diff.is_incomplete);
    assert_eq!(diff.end.as_deref(), Some("README.md"));
}

#[test]
fn comment_affordances() {
    assert!(!DiffLine::section("@@ -1 +1 @@", SectionInfo::default()).can_comment());
    for kind in [DiffLineType::Add, DiffLineType::Del, DiffLineType::Plain] {
        assert!(DiffLine::new(kind, 1, 1, " x").can_comment());
    }
    assert_eq!(
        DiffLine::new(DiffLineType::Del, 3, 0, "-x").comment_side(),
        CommentSide::Previous
    );
    assert_eq!(
        DiffLine::new(DiffLineType::Add, 0, 3, "+x").comment_side(),
        CommentSide::Proposed
    );
}
