//! Best-effort recovery of hunk lines that are not valid UTF-8.
//!
//! While scanning, lines that fail UTF-8 validation are stored lossily and
//! their raw bytes are kept aside. Once the patch is read, every file that
//! has such lines gets its encoding sniffed, separately for context, added
//! and removed lines since the two sides of a diff may use different
//! encodings, and the raw lines are transcoded.

use crate::diff::{DiffFile, DiffLineType};
use chardetng::EncodingDetector;
use encoding_rs::UTF_8;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub(crate) struct UndecodedLines {
    /// file index -> (section, line) -> raw bytes without the marker
    files: HashMap<usize, HashMap<(usize, usize), Vec<u8>>>,
}

impl UndecodedLines {
    pub fn record(&mut self, file: usize, section: usize, line: usize, bytes: Vec<u8>) {
        self.files
            .entry(file)
            .or_default()
            .insert((section, line), bytes);
    }

    /// Forget raw bytes of a section whose lines were dropped
    pub fn discard_section(&mut self, file: usize, section: usize) {
        if let Some(lines) = self.files.get_mut(&file) {
            lines.retain(|&(s, _), _| s != section);
        }
    }

    /// Transcode recorded lines in place.
    pub fn apply(self, files: &mut [DiffFile]) {
        for (file_idx, raw) in self.files {
            let Some(file) = files.get_mut(file_idx) else {
                continue;
            };
            for kind in [DiffLineType::Plain, DiffLineType::Add, DiffLineType::Del] {
                transcode_kind(file, kind, &raw);
            }
        }
    }
}

fn transcode_kind(file: &mut DiffFile, kind: DiffLineType, raw: &HashMap<(usize, usize), Vec<u8>>) {
    let mut sample = Vec::new();
    let mut pending = Vec::new();
    for (s, section) in file.sections.iter().enumerate() {
        for (l, line) in section.lines.iter().enumerate() {
            if line.kind != kind {
                continue;
            }
            match raw.get(&(s, l)) {
                Some(bytes) => {
                    sample.extend_from_slice(bytes);
                    pending.push((s, l));
                }
                None => sample.extend_from_slice(line.text().as_bytes()),
            }
            sample.push(b'\n');
        }
    }
    if pending.is_empty() {
        return;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true);
    if encoding == UTF_8 {
        debug!(file = %file.name, ?kind, "undecodable lines left as lossy utf-8");
        return;
    }

    for (s, l) in pending {
        let (Some(bytes), Some(line)) = (
            raw.get(&(s, l)),
            file.sections.get_mut(s).and_then(|sec| sec.lines.get_mut(l)),
        ) else {
            continue;
        };
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(file = %file.name, encoding = encoding.name(), "transcode failed");
            continue;
        }
        let marker = line.kind.marker().unwrap_or(' ');
        line.content = format!("{marker}{text}");
    }
}
