//! Post-processing of raw character diffs.
//!
//! A Myers diff over characters tends to produce many tiny edits separated
//! by one or two equal characters. These passes merge them into fewer,
//! larger edits that read better when rendered inline.

use super::{Operation, Segment};
use similar::{Algorithm, DiffTag, capture_diff_slices};

/// Character-level diff of `a` against `b`, merged into runs.
pub(crate) fn diff_chars(a: &str, b: &str) -> Vec<Segment> {
    let old: Vec<char> = a.chars().collect();
    let new: Vec<char> = b.chars().collect();
    let mut segments = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old_text = || old[old_range.clone()].iter().collect::<String>();
        let new_text = || new[new_range.clone()].iter().collect::<String>();
        match tag {
            DiffTag::Equal => segments.push(Segment::new(Operation::Equal, old_text())),
            DiffTag::Delete => segments.push(Segment::new(Operation::Delete, old_text())),
            DiffTag::Insert => segments.push(Segment::new(Operation::Insert, new_text())),
            DiffTag::Replace => {
                segments.push(Segment::new(Operation::Delete, old_text()));
                segments.push(Segment::new(Operation::Insert, new_text()));
            }
        }
    }

    cleanup_merge(segments)
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}

fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Fold short equalities that sit between edits into the edits.
///
/// An equality shorter than `edit_cost` bytes costs more to show than to
/// rewrite when it has edits on both sides, or on three of the four sides
/// and is shorter than half the cost.
pub(crate) fn cleanup_efficiency(mut diffs: Vec<Segment>, edit_cost: usize) -> Vec<Segment> {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut next = 0;
    let (mut pre_ins, mut pre_del, mut post_ins, mut post_del) = (false, false, false, false);

    while next < diffs.len() {
        let idx = next;
        next += 1;
        if diffs[idx].op == Operation::Equal {
            if diffs[idx].text.len() < edit_cost && (post_ins || post_del) {
                equalities.push(idx);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[idx].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[idx].op == Operation::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            let sides = [pre_ins, pre_del, post_ins, post_del]
                .iter()
                .filter(|&&b| b)
                .count();
            let split = last_equality.as_ref().filter(|eq| {
                !eq.is_empty()
                    && ((pre_ins && pre_del && post_ins && post_del)
                        || (eq.len() < edit_cost / 2 && sides == 3))
            });

            if let (Some(eq), Some(&at)) = (split.cloned(), equalities.last()) {
                diffs.insert(at, Segment::new(Operation::Delete, eq));
                diffs[at + 1].op = Operation::Insert;
                equalities.pop();
                last_equality = None;
                if pre_ins && pre_del {
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    // Rescan from just after the previous equality
                    next = equalities.last().map_or(0, |&p| p + 1);
                    post_ins = false;
                    post_del = false;
                }
                changes = true;
            }
        }
    }

    if changes {
        diffs = cleanup_merge(diffs);
    }
    diffs
}

/// Merge adjacent runs of the same kind, pull common prefixes and suffixes
/// of paired edits into the surrounding equalities, and slide single edits
/// over equal neighbours where that removes an equality.
pub(crate) fn cleanup_merge(mut diffs: Vec<Segment>) -> Vec<Segment> {
    diffs.push(Segment::new(Operation::Equal, String::new()));
    let mut pointer = 0;
    let (mut count_del, mut count_ins) = (0, 0);
    let (mut text_del, mut text_ins) = (String::new(), String::new());

    while pointer < diffs.len() {
        match diffs[pointer].op {
            Operation::Insert => {
                count_ins += 1;
                text_ins.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            Operation::Delete => {
                count_del += 1;
                text_del.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            Operation::Equal => {
                if count_del + count_ins > 1 {
                    if count_del != 0 && count_ins != 0 {
                        let prefix = common_prefix(&text_ins, &text_del);
                        if prefix != 0 {
                            let start = pointer - count_del - count_ins;
                            let common = text_ins[..prefix].to_string();
                            if start > 0 && diffs[start - 1].op == Operation::Equal {
                                diffs[start - 1].text.push_str(&common);
                            } else {
                                diffs.insert(0, Segment::new(Operation::Equal, common));
                                pointer += 1;
                            }
                            text_ins.drain(..prefix);
                            text_del.drain(..prefix);
                        }
                        let suffix = common_suffix(&text_ins, &text_del);
                        if suffix != 0 {
                            let common = text_ins.split_off(text_ins.len() - suffix);
                            text_del.truncate(text_del.len() - suffix);
                            diffs[pointer].text.insert_str(0, &common);
                        }
                    }

                    let start = pointer - count_del - count_ins;
                    let mut merged = Vec::with_capacity(2);
                    if !text_del.is_empty() {
                        merged.push(Segment::new(Operation::Delete, std::mem::take(&mut text_del)));
                    }
                    if !text_ins.is_empty() {
                        merged.push(Segment::new(Operation::Insert, std::mem::take(&mut text_ins)));
                    }
                    let inserted = merged.len();
                    diffs.splice(start..pointer, merged);
                    pointer = start + inserted + 1;
                } else if pointer != 0 && diffs[pointer - 1].op == Operation::Equal {
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.push_str(&text);
                } else {
                    pointer += 1;
                }
                count_del = 0;
                count_ins = 0;
                text_del.clear();
                text_ins.clear();
            }
        }
    }
    if diffs.last().is_some_and(|d| d.text.is_empty()) {
        diffs.pop();
    }

    // Second pass: shift single edits surrounded by equalities
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            let prev = diffs[pointer - 1].text.clone();
            let next = diffs[pointer + 1].text.clone();
            let edit = diffs[pointer].text.clone();
            if !prev.is_empty() && edit.ends_with(&prev) {
                diffs[pointer].text = format!("{prev}{}", &edit[..edit.len() - prev.len()]);
                diffs[pointer + 1].text = format!("{prev}{next}");
                diffs.remove(pointer - 1);
                changes = true;
            } else if !next.is_empty() && edit.starts_with(&next) {
                diffs[pointer - 1].text.push_str(&next);
                diffs[pointer].text = format!("{}{next}", &edit[next.len()..]);
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
    }

    if changes {
        diffs = cleanup_merge(diffs);
    }
    diffs
}
