use super::charset::UndecodedLines;
use super::header::parse_hunk_header;
use super::lfs::{LfsLookup, LfsProbe};
use super::reader::{LineReader, RawLine};
use super::{ParseLimits, PatchError};
use crate::diff::{DiffFile, DiffLine, DiffLineType, DiffSection, SectionInfo};
use std::io::BufRead;

const NO_NEWLINE_MARKER: &[u8] = b"\\ No newline at end of file";

/// Reads the hunks of a single file.
///
/// The section being filled is held aside until it is closed (by the next
/// `@@`, the next file or the end of input). An LFS pointer confirmed while
/// the section is open makes the section commit with no lines.
pub(super) struct HunkScanner<'s, 'f> {
    limits: ParseLimits,
    lfs: &'s dyn LfsLookup,
    file: &'f mut DiffFile,
    file_idx: usize,
    undecoded: &'f mut UndecodedLines,
    open: Option<DiffSection>,
    lfs_probe: LfsProbe,
    lfs_confirmed: bool,
    line_count: usize,
    left_line: u32,
    right_line: u32,
    /// Next deletion waiting for an addition to pair with
    pending_del: Option<usize>,
}

impl<'s, 'f> HunkScanner<'s, 'f> {
    pub fn new(
        limits: ParseLimits,
        lfs: &'s dyn LfsLookup,
        file: &'f mut DiffFile,
        file_idx: usize,
        undecoded: &'f mut UndecodedLines,
    ) -> Self {
        Self {
            limits,
            lfs,
            file,
            file_idx,
            undecoded,
            open: None,
            lfs_probe: LfsProbe::default(),
            lfs_confirmed: false,
            line_count: 0,
            left_line: 1,
            right_line: 1,
            pending_del: None,
        }
    }

    /// Scan until the next file header (returned) or end of input.
    pub fn run<R: BufRead>(
        mut self,
        input: &mut LineReader<R>,
    ) -> Result<Option<RawLine>, PatchError> {
        let result = self.scan(input);
        self.close_section();
        result
    }

    fn at_line_limit(&self) -> bool {
        self.limits
            .max_lines
            .is_some_and(|max| self.line_count >= max)
    }

    fn scan<R: BufRead>(&mut self, input: &mut LineReader<R>) -> Result<Option<RawLine>, PatchError> {
        loop {
            let Some(raw) = input.read_line_exempt(self.limits.max_line_characters, b"d@\\")? else {
                return Ok(None);
            };
            let Some(&first) = raw.bytes.first() else {
                return Err(PatchError::UnexpectedHunkLine {
                    line: String::new(),
                });
            };

            match first {
                // Next file header, validated by the caller
                b'd' => return Ok(Some(raw)),
                b'@' => {
                    if self.at_line_limit() {
                        self.file.is_incomplete = true;
                        continue;
                    }
                    self.open_section(raw.text())?;
                }
                b'\\' => {
                    // Belongs to the line before it, which was kept or already flagged
                    if self.at_line_limit() {
                        continue;
                    }
                    if raw.bytes != NO_NEWLINE_MARKER {
                        return Err(PatchError::InvalidNoNewlineMarker { line: raw.text() });
                    }
                }
                b'+' => self.push_line(DiffLineType::Add, raw)?,
                b'-' => self.push_line(DiffLineType::Del, raw)?,
                b' ' => self.push_line(DiffLineType::Plain, raw)?,
                _ => return Err(PatchError::UnexpectedHunkLine { line: raw.text() }),
            }
        }
    }

    fn open_section(&mut self, text: String) -> Result<(), PatchError> {
        let Some(header) = parse_hunk_header(&text) else {
            return Err(PatchError::InvalidHunkHeader { line: text });
        };
        self.close_section();

        let info = SectionInfo {
            path: self.file.name.clone(),
            last_left_idx: self.left_line.saturating_sub(1),
            last_right_idx: self.right_line.saturating_sub(1),
            left_idx: header.left_start,
            right_idx: header.right_start,
            left_hunk_size: header.left_size,
            right_hunk_size: header.right_size,
        };
        self.left_line = header.left_start;
        self.right_line = header.right_start;

        let mut section = DiffSection::new(self.file.name.clone());
        section.lines.push(DiffLine::section(text, info));
        self.open = Some(section);
        Ok(())
    }

    fn close_section(&mut self) {
        self.pending_del = None;
        let Some(mut section) = self.open.take() else {
            return;
        };
        if self.lfs_confirmed {
            section.lines.clear();
            self.undecoded
                .discard_section(self.file_idx, self.file.sections.len());
            self.lfs_confirmed = false;
        }
        self.file.sections.push(section);
    }

    fn push_line(&mut self, kind: DiffLineType, raw: RawLine) -> Result<(), PatchError> {
        self.line_count += 1;
        match kind {
            DiffLineType::Add => self.file.addition += 1,
            DiffLineType::Del => self.file.deletion += 1,
            _ => {}
        }
        if self.limits.max_lines.is_some_and(|max| self.line_count > max) {
            self.file.is_incomplete = true;
            return Ok(());
        }

        let next = |n: u32| {
            n.checked_add(1).ok_or_else(|| PatchError::LineNumberOverflow { line: raw.text() })
        };
        let (left, right) = match kind {
            DiffLineType::Add => {
                let right = self.right_line;
                self.right_line = next(right)?;
                (0, right)
            }
            DiffLineType::Del => {
                let left = self.left_line;
                if left > 0 {
                    self.left_line = next(left)?;
                }
                (left, 0)
            }
            _ => {
                let (left, right) = (self.left_line, self.right_line);
                self.left_line = next(left)?;
                self.right_line = next(right)?;
                (left, right)
            }
        };

        let mut bytes = raw.bytes;
        if raw.truncated {
            self.file.is_incomplete = true;
            self.file.is_incomplete_line_too_long = true;
            // Drop a multi-byte sequence split by the cut
            if let Err(e) = std::str::from_utf8(&bytes)
                && e.error_len().is_none()
            {
                bytes.truncate(e.valid_up_to());
            }
        }

        let section_idx = self.file.sections.len();
        let name = &self.file.name;
        let section = self
            .open
            .get_or_insert_with(|| DiffSection::new(name.clone()));
        let index = section.lines.len();

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                let bytes = e.into_bytes();
                let content = String::from_utf8_lossy(&bytes).into_owned();
                self.undecoded.record(
                    self.file_idx,
                    section_idx,
                    index,
                    bytes.get(1..).unwrap_or_default().to_vec(),
                );
                content
            }
        };

        let mut line = DiffLine::new(kind, left, right, content);
        match kind {
            DiffLineType::Del => {
                if section.lines.last().is_none_or(|l| l.kind != DiffLineType::Del) {
                    self.pending_del = Some(index);
                }
            }
            DiffLineType::Add => {
                if let Some(del) = self.pending_del
                    && let Some(del_line) = section.lines.get_mut(del)
                {
                    del_line.matched = Some(index);
                    line.matched = Some(del);
                    let next = del + 1;
                    self.pending_del = section
                        .lines
                        .get(next)
                        .is_some_and(|l| l.kind == DiffLineType::Del)
                        .then_some(next);
                }
            }
            _ => self.pending_del = None,
        }

        let lfs = self.lfs;
        if self
            .lfs_probe
            .observe(line.text())
            .is_some_and(|oid| lfs.is_tracked_oid(oid))
        {
            self.lfs_confirmed = true;
            self.file.is_bin = true;
            self.file.is_lfs_file = true;
        }
        section.lines.push(line);
        Ok(())
    }
}
