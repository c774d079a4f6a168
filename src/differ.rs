//! Line Differ: LCS-based line diff blocks, the user-facing line-change
//! view, and the identical-files predicate.
//!
//! Block computation is grounded on the `similar` crate's generic
//! `capture_diff_slices`, the same engine `dandavison-delta` and the `jj`
//! workspace crates use for their line diffs.

use similar::{capture_diff_slices, Algorithm, ChangeTag, DiffOp, TextDiff};

/// A maximal contiguous change region between line sequences A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffBlock {
    pub delete_start_a: usize,
    pub delete_count_a: usize,
    pub insert_start_b: usize,
    pub insert_count_b: usize,
}

/// A single user-facing per-line change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDifference {
    Added { line_no_b: usize, content_b: String },
    Deleted { line_no_a: usize, content_a: String },
    Modified { line_no_a: usize, content_a: String, line_no_b: usize, content_b: String },
}

fn normalize_ws(line: &str) -> String {
    line.trim().to_string()
}

/// Compute diff blocks between `a` and `b`. When `ignore_whitespace` is
/// true, lines are compared after trimming (used for similarity scoring
/// and the `identical` predicate); the block *ranges* still index into
/// the original, untrimmed sequences.
pub fn diff(a: &[String], b: &[String], ignore_whitespace: bool) -> Vec<DiffBlock> {
    let ops: Vec<DiffOp> = if ignore_whitespace {
        let na: Vec<String> = a.iter().map(|l| normalize_ws(l)).collect();
        let nb: Vec<String> = b.iter().map(|l| normalize_ws(l)).collect();
        capture_diff_slices(Algorithm::Myers, &na, &nb)
    } else {
        capture_diff_slices(Algorithm::Myers, a, b)
    };

    ops.into_iter()
        .filter_map(|op| match op {
            DiffOp::Equal { .. } => None,
            DiffOp::Delete { old_index, old_len, .. } => Some(DiffBlock {
                delete_start_a: old_index,
                delete_count_a: old_len,
                insert_start_b: 0,
                insert_count_b: 0,
            }),
            DiffOp::Insert { new_index, new_len, .. } => Some(DiffBlock {
                delete_start_a: 0,
                delete_count_a: 0,
                insert_start_b: new_index,
                insert_count_b: new_len,
            }),
            DiffOp::Replace { old_index, old_len, new_index, new_len } => Some(DiffBlock {
                delete_start_a: old_index,
                delete_count_a: old_len,
                insert_start_b: new_index,
                insert_count_b: new_len,
            }),
        })
        .collect()
}

/// `true` iff `a` and `b` have no differences once whitespace is ignored.
pub fn identical(a: &[String], b: &[String]) -> bool {
    diff(a, b, true).is_empty()
}

/// Flatten raw per-line changes into the user-facing view, pairing
/// corresponding delete+insert lines within the same diff op into a
/// single `Modified` record. Pairing is by position *within the
/// op*, not by content similarity — the simplest policy that matches the
/// common case of a line being edited in place; see DESIGN.md for the
/// rationale.
pub fn line_differences(a: &[String], b: &[String]) -> Vec<LineDifference> {
    let ops = capture_diff_slices(Algorithm::Myers, a, b);
    let mut out = Vec::new();

    for op in ops {
        match op {
            DiffOp::Equal { .. } => {},
            DiffOp::Delete { old_index, old_len, .. } => {
                for i in 0..old_len {
                    out.push(LineDifference::Deleted {
                        line_no_a: old_index + i,
                        content_a: a[old_index + i].clone(),
                    });
                }
            },
            DiffOp::Insert { new_index, new_len, .. } => {
                for i in 0..new_len {
                    out.push(LineDifference::Added {
                        line_no_b: new_index + i,
                        content_b: b[new_index + i].clone(),
                    });
                }
            },
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                let paired = old_len.min(new_len);
                for i in 0..paired {
                    out.push(LineDifference::Modified {
                        line_no_a: old_index + i,
                        content_a: a[old_index + i].clone(),
                        line_no_b: new_index + i,
                        content_b: b[new_index + i].clone(),
                    });
                }
                for i in paired..old_len {
                    out.push(LineDifference::Deleted {
                        line_no_a: old_index + i,
                        content_a: a[old_index + i].clone(),
                    });
                }
                for i in paired..new_len {
                    out.push(LineDifference::Added {
                        line_no_b: new_index + i,
                        content_b: b[new_index + i].clone(),
                    });
                }
            },
        }
    }

    out
}

/// Render a standard git-style unified diff with 3 lines of context,
/// for the UI surface.
pub fn render_unified_diff(a: &[String], b: &[String]) -> String {
    let old_text = joined_with_trailing_newline(a);
    let new_text = joined_with_trailing_newline(b);
    let diff = TextDiff::from_lines(&old_text, &new_text);
    diff.unified_diff()
        .context_radius(3)
        .header("a", "b")
        .to_string()
}

fn joined_with_trailing_newline(lines: &[String]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut s = lines.join("\n");
    s.push('\n');
    s
}

/// Classify a raw per-line change by `ChangeTag`, used by callers that
/// want the `similar` crate's own three-way tag rather than this
/// module's richer `LineDifference`.
pub fn change_tag_counts(a: &[String], b: &[String]) -> (usize, usize, usize) {
    let old_text = joined_with_trailing_newline(a);
    let new_text = joined_with_trailing_newline(b);
    let diff = TextDiff::from_lines(&old_text, &new_text);
    let (mut equal, mut delete, mut insert) = (0, 0, 0);
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => equal += 1,
            ChangeTag::Delete => delete += 1,
            ChangeTag::Insert => insert += 1,
        }
    }
    (equal, delete, insert)
}
