//! Parsers for the two structured header lines of a git patch.
//!
//! - `diff --git a/<old> b/<new>`, where either path may be C-quoted
//!   (`"a/caf\303\251.txt"`) and unquoted paths may contain spaces, which
//!   makes them ambiguous until a later header settles them.
//! - `@@ -l,s +l,s @@ context`, where either size may be omitted.

use nom::IResult;
use nom::Parser;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32 as parse_u32};
use nom::combinator::{opt, rest};
use nom::sequence::preceded;

/// File names recovered from a `diff --git` line (prefix already removed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HeaderNames {
    pub old_name: String,
    pub name: String,
    pub ambiguous: bool,
}

/// Split the arguments of a `diff --git` line into old and new names.
pub(crate) fn parse_diff_names(args: &str) -> HeaderNames {
    let mut cursor = NameCursor::new(args);
    let (old_name, old_ambiguous) = cursor.read_name();
    let (name, new_ambiguous) = cursor.read_name();
    let mut names = HeaderNames {
        old_name,
        name,
        ambiguous: false,
    };

    if old_ambiguous && new_ambiguous {
        names.ambiguous = true;
        // `a/X b/X` splits evenly around a single space
        if args.len() % 2 == 1 {
            let midpoint = args.len() / 2;
            if let (Some(new), Some(old)) = (args.get(..midpoint), args.get(midpoint + 1..))
                && new.len() > 2
                && old.len() > 2
                && new.get(2..) == old.get(2..)
            {
                let resolved = old.get(2..).unwrap_or_default().to_string();
                names.old_name = resolved.clone();
                names.name = resolved;
            }
        }
    }
    names
}

/// Name from a `--- a/<path>` or `+++ b/<path>` line, if it carries `side`.
///
/// `/dev/null` and anything too short yields `None`; a trailing tab that git
/// appends to names with spaces is dropped.
pub(crate) fn unified_header_name(line: &str, side: u8) -> Option<String> {
    if line.len() <= 6 || line.as_bytes().get(4) != Some(&side) {
        return None;
    }
    let name = line.get(6..)?;
    Some(name.strip_suffix('\t').unwrap_or(name).to_string())
}

struct NameCursor<'a> {
    rest: &'a str,
}

impl<'a> NameCursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn skip_spaces(&mut self) {
        self.rest = self.rest.trim_start_matches(char::is_whitespace);
    }

    fn token(&mut self) -> &'a str {
        self.skip_spaces();
        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        self.skip_spaces();
        token
    }

    /// Read one name and strip its two-character `a/` or `b/` prefix.
    fn read_name(&mut self) -> (String, bool) {
        let (raw, ambiguous) = if self.peek() == Some('"') {
            match unquote(self.rest) {
                Some((name, rest)) => {
                    self.rest = rest;
                    self.skip_spaces();
                    let name = name.strip_prefix('\\').map(str::to_string).unwrap_or(name);
                    (name, false)
                }
                None => {
                    self.rest = "";
                    return (String::new(), true);
                }
            }
        } else {
            let mut name = self.token().to_string();
            while let Some(next) = self.peek()
                && next != '"'
                && next != 'b'
            {
                name.push(' ');
                name.push_str(self.token());
            }
            (name, true)
        };

        match raw.char_indices().nth(2) {
            Some((at, _)) => (raw[at..].to_string(), ambiguous),
            None if raw.chars().count() == 2 => (String::new(), ambiguous),
            None => (String::new(), true),
        }
    }
}

/// Decode a C-style quoted string at the start of `input`.
///
/// Octal escapes produce raw bytes, so multi-byte UTF-8 sequences written as
/// `\303\251` come back as one character. Returns the decoded text and the
/// input after the closing quote, or `None` if the quote is never closed.
pub(crate) fn unquote(input: &str) -> Option<(String, &str)> {
    let body = input.strip_prefix('"')?;
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let rest = body.get(i + 1..)?;
                return Some((String::from_utf8_lossy(&out).into_owned(), rest));
            }
            b'\\' => {
                let esc = *bytes.get(i + 1)?;
                i += 2;
                let decoded = match esc {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    b'0'..=b'7' => {
                        let digits = bytes.get(i - 1..i + 2)?;
                        if !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                            return None;
                        }
                        i += 2;
                        digits
                            .iter()
                            .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'))
                            .try_into()
                            .ok()?
                    }
                    other => other,
                };
                out.push(decoded);
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    None
}

/// Boundaries declared by a `@@` hunk header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HunkHeader {
    pub left_start: u32,
    pub left_size: u32,
    pub right_start: u32,
    pub right_size: u32,
}

fn hunk_range(input: &str) -> IResult<&str, (u32, Option<u32>)> {
    (parse_u32, opt(preceded(char(','), parse_u32))).parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader> {
    (tag("@@ -"), hunk_range, tag(" +"), hunk_range, tag(" @@"), rest)
        .map(|(_, (left_start, left_size), _, (right_start, right_size), _, _)| HunkHeader {
            left_start,
            // An omitted size means a single line
            left_size: left_size.unwrap_or(1),
            right_start,
            right_size: right_size.unwrap_or(1),
        })
        .parse(input)
}

/// Parse a `@@ -l,s +l,s @@` line, returning `None` when malformed.
pub(crate) fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    hunk_header(line).ok().map(|(_, header)| header)
}
