use super::CsvDiffOptions;

/// For each column of one side, the matching column of the other side
pub(crate) type ColumnMap = Vec<Option<usize>>;

/// Pair up the columns of `base` and `head` (header row first).
///
/// Header cells are matched by equal text, each head column used at most
/// once. Columns still unmatched are then compared by their data rows,
/// in both directions.
pub(crate) fn column_mapping(
    base: &[Vec<String>],
    head: &[Vec<String>],
    options: &CsvDiffOptions,
) -> (ColumnMap, ColumnMap) {
    let base_header = base.first().map(Vec::as_slice).unwrap_or_default();
    let head_header = head.first().map(Vec::as_slice).unwrap_or_default();
    let mut base_to_head: ColumnMap = vec![None; base_header.len()];
    let mut head_to_base: ColumnMap = vec![None; head_header.len()];

    for (i, name) in base_header.iter().enumerate() {
        if let Some(j) = (0..head_header.len()).find(|&j| head_to_base[j].is_none() && head_header[j] == *name) {
            base_to_head[i] = Some(j);
            head_to_base[j] = Some(i);
        }
    }

    map_by_content(base, &mut base_to_head, head, &mut head_to_base, options);
    map_by_content(head, &mut head_to_base, base, &mut base_to_head, options);
    (base_to_head, head_to_base)
}

/// Map unmatched `from` columns to unmatched `to` columns whose sampled
/// data rows agree often enough.
///
/// Only one candidate is tried per column: the slot right after the target
/// of its left neighbour, or the first slot for the first column. A column
/// whose left neighbour is unmapped is left alone.
fn map_by_content(
    from: &[Vec<String>],
    from_map: &mut ColumnMap,
    to: &[Vec<String>],
    to_map: &mut ColumnMap,
    options: &CsvDiffOptions,
) {
    let rows = options
        .sample_rows
        .min(from.len().min(to.len()).saturating_sub(1));
    if rows == 0 {
        return;
    }

    let mut candidate = Some(0);
    for i in 0..from_map.len() {
        if from_map[i].is_none()
            && let Some(j) = candidate
            && to_map.get(j).is_some_and(Option::is_none)
        {
            let same = (1..=rows)
                .filter(|&r| matches!((from[r].get(i), to[r].get(j)), (Some(a), Some(b)) if a == b))
                .count();
            if same as f64 / rows as f64 >= options.min_match_ratio {
                from_map[i] = Some(j);
                to_map[j] = Some(i);
            }
        }
        candidate = from_map[i].map(|j| j + 1);
    }
}

/// Number of columns without a partner
pub(crate) fn count_unmapped(map: &ColumnMap) -> usize {
    map.iter().filter(|m| m.is_none()).count()
}
