//! Cell-level diffs of CSV files.
//!
//! The line diff of a CSV file already says which records changed. This
//! module lines up the columns of both versions (by header name, then by
//! content) and turns each diff line into a row of cells marked equal,
//! changed, added or deleted.

mod columns;
mod rows;

use crate::diff::DiffFile;
use columns::{column_mapping, count_unmapped};
use error_set::error_set;
use rows::{RowBuilder, RowPair, try_merge_lines};
use serde::Serialize;
use std::io::Read;
use std::num::NonZeroU32;
use std::path::Path;
use tracing::debug;

error_set! {
    /// Errors raised while diffing CSV content
    TableError := {
        CsvError(csv::Error),
        IoError(std::io::Error),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableDiffCellType {
    Equal,
    Changed,
    Add,
    Del,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiffCell {
    pub left_cell: String,
    pub right_cell: String,
    #[serde(rename = "type")]
    pub kind: TableDiffCellType,
    /// The column sits at a different position than in the old file
    pub moved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDiffRow {
    /// Record number in the new file, absent for deleted records
    pub row_idx: Option<NonZeroU32>,
    pub cells: Vec<TableDiffCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableDiffSection {
    pub rows: Vec<TableDiffRow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsvDiffOptions {
    /// Data rows compared when matching columns by content
    pub sample_rows: usize,
    /// Share of sampled rows that must agree for a content match
    pub min_match_ratio: f64,
    /// Field separator; sniffed from the file when unset
    pub delimiter: Option<u8>,
}

impl Default for CsvDiffOptions {
    fn default() -> Self {
        Self {
            sample_rows: 10,
            min_match_ratio: 0.8,
            delimiter: None,
        }
    }
}

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Guess the field separator from the file extension or the first line.
///
/// The candidate occurring most often in the first line wins; ties go to
/// the earlier candidate, so plain text falls back to a comma.
#[must_use]
pub fn sniff_delimiter(file_name: &str, content: &[u8]) -> u8 {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("tsv") => return b'\t',
        Some("psv") => return b'|',
        _ => {}
    }

    let first_line = content.split(|&b| b == b'\n').next().unwrap_or_default();
    let count = |d: u8| first_line.iter().filter(|&&b| b == d).count();
    let mut best = (CANDIDATE_DELIMITERS[0], count(CANDIDATE_DELIMITERS[0]));
    for d in &CANDIDATE_DELIMITERS[1..] {
        let n = count(*d);
        if n > best.1 {
            best = (*d, n);
        }
    }
    best.0
}

fn read_records<R: Read>(
    file_name: &str,
    mut reader: R,
    options: &CsvDiffOptions,
) -> Result<Vec<Vec<String>>, TableError> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(file_name, &content));

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .delimiter(delimiter)
        .from_reader(content.as_slice());
    let mut records = Vec::new();
    for record in csv_reader.records() {
        records.push(record?.iter().map(str::to_string).collect());
    }
    Ok(records)
}

fn single_side(records: Vec<Vec<String>>, kind: TableDiffCellType) -> Vec<TableDiffSection> {
    let rows = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| TableDiffRow {
            row_idx: u32::try_from(i + 1).ok().and_then(NonZeroU32::new),
            cells: record
                .into_iter()
                .map(|value| {
                    let (left_cell, right_cell) = match kind {
                        TableDiffCellType::Del => (value, String::new()),
                        _ => (String::new(), value),
                    };
                    TableDiffCell {
                        left_cell,
                        right_cell,
                        kind,
                        moved: false,
                    }
                })
                .collect(),
        })
        .collect();
    vec![TableDiffSection { rows }]
}

/// Diff the old (`base`) and new (`head`) content of a CSV file.
///
/// Either side may be absent for an added or deleted file, in which case
/// every cell is marked added or deleted. Otherwise rows follow the hunks
/// of `diff_file`, one table section per hunk, and the header row is always
/// shown first.
///
/// # Errors
///
/// Returns [`TableError`] when either side cannot be read or is not
/// well-formed CSV (including records with a differing field count).
pub fn create_csv_diff<B: Read, H: Read>(
    diff_file: &DiffFile,
    base: Option<B>,
    head: Option<H>,
    options: &CsvDiffOptions,
) -> Result<Vec<TableDiffSection>, TableError> {
    let base = base
        .map(|r| read_records(&diff_file.old_name, r, options))
        .transpose()?;
    let head = head
        .map(|r| read_records(&diff_file.name, r, options))
        .transpose()?;

    let (base, head) = match (base, head) {
        (Some(base), Some(head)) => (base, head),
        (Some(base), None) => return Ok(single_side(base, TableDiffCellType::Del)),
        (None, Some(head)) => return Ok(single_side(head, TableDiffCellType::Add)),
        (None, None) => return Ok(Vec::new()),
    };

    let (base_to_head, head_to_base) = column_mapping(&base, &head, options);
    let width = if base_to_head.len() < head_to_base.len() {
        head_to_base.len() + count_unmapped(&base_to_head)
    } else {
        base_to_head.len() + count_unmapped(&head_to_base)
    };
    debug!(
        file = %diff_file.name,
        base_columns = base_to_head.len(),
        head_columns = head_to_base.len(),
        width,
        "columns aligned"
    );

    let builder = RowBuilder {
        base: &base,
        head: &head,
        base_to_head: &base_to_head,
        head_to_base: &head_to_base,
        width,
    };

    let mut sections = Vec::new();
    for (i, section) in diff_file.sections.iter().enumerate() {
        let mut rows = Vec::new();
        for (j, pair) in try_merge_lines(&section.lines).into_iter().enumerate() {
            if i == 0 && j == 0 && !pair.is_first_row() {
                rows.extend(builder.build(RowPair::first_row()));
            }
            rows.extend(builder.build(pair));
        }
        if !rows.is_empty() {
            sections.push(TableDiffSection { rows });
        }
    }
    Ok(sections)
}
