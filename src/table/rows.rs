use super::columns::ColumnMap;
use super::{TableDiffCell, TableDiffCellType, TableDiffRow};
use crate::diff::{DiffLine, DiffLineType};
use std::num::NonZeroU32;

/// Old/new line numbers of one table row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowPair {
    pub left: Option<NonZeroU32>,
    pub right: Option<NonZeroU32>,
}

impl RowPair {
    pub fn is_first_row(self) -> bool {
        self.left.is_some_and(|n| n.get() == 1) && self.right.is_some_and(|n| n.get() == 1)
    }

    pub fn first_row() -> Self {
        Self {
            left: NonZeroU32::new(1),
            right: NonZeroU32::new(1),
        }
    }
}

/// Line pairs of a hunk with deletions and the additions that follow them
/// folded together.
///
/// Section lines are skipped. An addition right after a run of unpaired
/// deletions fills the earliest of them, so a record that was deleted and
/// re-added shows up as one changed row.
pub(crate) fn try_merge_lines(lines: &[DiffLine]) -> Vec<RowPair> {
    let mut merged: Vec<RowPair> = Vec::new();
    for line in lines.iter().filter(|l| l.kind != DiffLineType::Section) {
        let pair = RowPair {
            left: line.left_idx,
            right: line.right_idx,
        };
        if pair.left.is_none() && merged.last().is_some_and(|p| p.right.is_none()) {
            let run = merged.iter().rev().take_while(|p| p.right.is_none()).count();
            let at = merged.len() - run;
            merged[at].right = pair.right;
            continue;
        }
        merged.push(pair);
    }
    merged
}

fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).cloned().unwrap_or_default()
}

fn record(rows: &[Vec<String>], line: Option<NonZeroU32>) -> Option<&[String]> {
    let idx = usize::try_from(line?.get()).ok()? - 1;
    rows.get(idx).map(Vec::as_slice)
}

/// Builds table rows from line pairs once the columns are aligned.
pub(crate) struct RowBuilder<'a> {
    pub base: &'a [Vec<String>],
    pub head: &'a [Vec<String>],
    pub base_to_head: &'a ColumnMap,
    pub head_to_base: &'a ColumnMap,
    pub width: usize,
}

impl RowBuilder<'_> {
    /// One row of the table, or `None` when neither side has the record.
    ///
    /// Columns are laid out in head order with deleted base columns placed
    /// where they used to sit.
    pub fn build(&self, pair: RowPair) -> Option<TableDiffRow> {
        let a_row = record(self.base, pair.left);
        let b_row = record(self.head, pair.right);
        if a_row.is_none() && b_row.is_none() {
            return None;
        }

        let a_len = self.base_to_head.len();
        let b_len = self.head_to_base.len();
        let mut cells = Vec::with_capacity(self.width);
        let (mut a, mut b) = (0, 0);
        let (mut added, mut deleted) = (0, 0);

        while a < a_len || b < b_len {
            while a < a_len && self.base_to_head[a].is_none() && (b >= b_len || a <= b) {
                cells.push(TableDiffCell {
                    left_cell: a_row.map(|r| cell(r, a)).unwrap_or_default(),
                    right_cell: String::new(),
                    kind: TableDiffCellType::Del,
                    moved: false,
                });
                a += 1;
                deleted += 1;
            }

            while a < a_len && self.base_to_head[a].is_some() {
                a += 1;
            }

            while b < b_len && self.head_to_base[b].is_none() && (a >= a_len || b < a) {
                cells.push(TableDiffCell {
                    left_cell: String::new(),
                    right_cell: b_row.map(|r| cell(r, b)).unwrap_or_default(),
                    kind: if b_row.is_some() {
                        TableDiffCellType::Add
                    } else {
                        TableDiffCellType::Del
                    },
                    moved: false,
                });
                b += 1;
                added += 1;
            }

            while b < b_len
                && let Some(src) = self.head_to_base[b]
                && (a >= a_len || b < a)
            {
                let left = a_row.map(|r| cell(r, src));
                let right = b_row.map(|r| cell(r, b));
                let (kind, moved) = match (&left, &right) {
                    (Some(l), Some(r)) => {
                        let kind = if l == r {
                            TableDiffCellType::Equal
                        } else {
                            TableDiffCellType::Changed
                        };
                        (kind, b + deleted != src + added)
                    }
                    (None, _) => (TableDiffCellType::Add, false),
                    (_, None) => (TableDiffCellType::Del, false),
                };
                cells.push(TableDiffCell {
                    left_cell: left.unwrap_or_default(),
                    right_cell: right.unwrap_or_default(),
                    kind,
                    moved,
                });
                b += 1;
            }
        }

        Some(TableDiffRow {
            row_idx: pair.right,
            cells,
        })
    }
}
