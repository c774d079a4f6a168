//! Block Merger: applies a per-block resolution to two diverging line
//! sequences, and a non-interactive fallback that emits git-style
//! conflict markers instead of asking.

use crate::differ::DiffBlock;
use similar::{capture_diff_slices, Algorithm, DiffOp};

const CONTEXT_LINES: usize = 3;

/// What to do with one differing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    UseA,
    UseB,
    UseBoth,
    Skip,
}

/// Up to 3 lines of unchanged context surrounding a block, shared by
/// both sides since context lines are by definition equal in A and B.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockContext {
    pub before: Vec<String>,
    pub after: Vec<String>,
}

/// Output of a merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    pub merged_lines: Vec<String>,
    pub conflicts: usize,
}

fn tail(lines: &[String], start: usize, end: usize) -> Vec<String> {
    let end = end.min(lines.len());
    let start = start.min(end);
    let from = end.saturating_sub(CONTEXT_LINES).max(start);
    lines[from..end].to_vec()
}

fn head(lines: &[String], start: usize, end: usize) -> Vec<String> {
    let start = start.min(lines.len());
    let end = end.min(lines.len()).min(start + CONTEXT_LINES);
    lines[start..end].to_vec()
}

/// Merge `a` and `b` line-by-line, calling `choose` once per differing
/// block to decide how to resolve it. Equal runs are copied through
/// unmodified. `choose` receives the block index (0-based, in document
/// order) alongside the block and its surrounding context.
pub fn merge<F>(a: &[String], b: &[String], mut choose: F) -> MergeResult
where
    F: FnMut(&DiffBlock, &BlockContext, usize) -> Choice,
{
    let ops = capture_diff_slices(Algorithm::Myers, a, b);
    let mut merged = Vec::new();
    let mut conflicts = 0usize;
    let mut block_index = 0usize;

    for (i, op) in ops.iter().enumerate() {
        match *op {
            DiffOp::Equal { old_index, len, .. } => {
                merged.extend_from_slice(&a[old_index..old_index + len]);
            },
            DiffOp::Delete { old_index, old_len, .. } => {
                let block = DiffBlock {
                    delete_start_a: old_index,
                    delete_count_a: old_len,
                    insert_start_b: 0,
                    insert_count_b: 0,
                };
                let ctx = context_for(&ops, i, a, b);
                apply_choice(&mut merged, a, b, &block, choose(&block, &ctx, block_index));
                conflicts += 1;
                block_index += 1;
            },
            DiffOp::Insert { new_index, new_len, .. } => {
                let block = DiffBlock {
                    delete_start_a: 0,
                    delete_count_a: 0,
                    insert_start_b: new_index,
                    insert_count_b: new_len,
                };
                let ctx = context_for(&ops, i, a, b);
                apply_choice(&mut merged, a, b, &block, choose(&block, &ctx, block_index));
                conflicts += 1;
                block_index += 1;
            },
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                let block = DiffBlock {
                    delete_start_a: old_index,
                    delete_count_a: old_len,
                    insert_start_b: new_index,
                    insert_count_b: new_len,
                };
                let ctx = context_for(&ops, i, a, b);
                apply_choice(&mut merged, a, b, &block, choose(&block, &ctx, block_index));
                conflicts += 1;
                block_index += 1;
            },
        }
    }

    MergeResult { merged_lines: merged, conflicts }
}

fn apply_choice(merged: &mut Vec<String>, a: &[String], b: &[String], block: &DiffBlock, choice: Choice) {
    let a_slice = &a[block.delete_start_a..block.delete_start_a + block.delete_count_a];
    let b_slice = &b[block.insert_start_b..block.insert_start_b + block.insert_count_b];
    match choice {
        Choice::UseA => merged.extend_from_slice(a_slice),
        Choice::UseB => merged.extend_from_slice(b_slice),
        Choice::UseBoth => {
            merged.extend_from_slice(a_slice);
            merged.extend_from_slice(b_slice);
        },
        Choice::Skip => {},
    }
}

fn context_for(ops: &[DiffOp], index: usize, a: &[String], b: &[String]) -> BlockContext {
    let before = ops[..index]
        .iter()
        .rev()
        .find_map(|op| match *op {
            DiffOp::Equal { old_index, len, .. } => Some(tail(a, old_index, old_index + len)),
            _ => None,
        })
        .unwrap_or_default();

    let after = ops[index + 1..]
        .iter()
        .find_map(|op| match *op {
            DiffOp::Equal { old_index, len, .. } => Some(head(a, old_index, old_index + len)),
            _ => None,
        })
        .unwrap_or_else(|| {
            // No trailing Equal run to pull from A; fall back to B's side
            // if the tail of the document came entirely from an insert.
            ops[index + 1..]
                .iter()
                .find_map(|op| match *op {
                    DiffOp::Insert { new_index, new_len, .. } => Some(head(b, new_index, new_index + new_len)),
                    _ => None,
                })
                .unwrap_or_default()
        });

    BlockContext { before, after }
}

/// Produce git-style conflict markers for every differing block instead
/// of asking a caller to resolve them. Used when no interactive
/// resolution is available.
pub fn fallback_merge(a: &[String], b: &[String]) -> MergeResult {
    merge(a, b, |block, _ctx, _index| {
        let _ = block;
        Choice::Skip
    })
    .into_conflict_markers(a, b)
}

impl MergeResult {
    /// Internal helper used only by `fallback_merge`: re-derives the
    /// block structure and re-emits it as conflict-marked text instead
    /// of the resolved lines `merge` would otherwise produce.
    fn into_conflict_markers(self, a: &[String], b: &[String]) -> MergeResult {
        let ops = capture_diff_slices(Algorithm::Myers, a, b);
        let mut merged = Vec::new();
        let mut conflicts = 0usize;

        for op in &ops {
            match *op {
                DiffOp::Equal { old_index, len, .. } => {
                    merged.extend_from_slice(&a[old_index..old_index + len]);
                },
                DiffOp::Delete { old_index, old_len, .. } => {
                    emit_conflict_markers(&mut merged, &a[old_index..old_index + old_len], &[]);
                    conflicts += 1;
                },
                DiffOp::Insert { new_index, new_len, .. } => {
                    emit_conflict_markers(&mut merged, &[], &b[new_index..new_index + new_len]);
                    conflicts += 1;
                },
                DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                    emit_conflict_markers(
                        &mut merged,
                        &a[old_index..old_index + old_len],
                        &b[new_index..new_index + new_len],
                    );
                    conflicts += 1;
                },
            }
        }

        MergeResult { merged_lines: merged, conflicts }
    }
}

/// Emit one conflict-marked block. A pure delete (`a_lines` non-empty,
/// `b_lines` empty) annotates the markers `(deleted)`/`(not present)`; a
/// pure insert (`a_lines` empty, `b_lines` non-empty) annotates them
/// `(not present)`/`(added)`; a replace (both non-empty) gets bare
/// markers. The empty side never gets a body line.
fn emit_conflict_markers(merged: &mut Vec<String>, a_lines: &[String], b_lines: &[String]) {
    let (a_suffix, b_suffix) = match (a_lines.is_empty(), b_lines.is_empty()) {
        (false, true) => (" (deleted)", " (not present)"),
        (true, false) => (" (not present)", " (added)"),
        _ => ("", ""),
    };
    merged.push(format!("<<<<<<< Version 1{a_suffix}"));
    merged.extend_from_slice(a_lines);
    merged.push("=======".to_string());
    merged.extend_from_slice(b_lines);
    merged.push(format!(">>>>>>> Version 2{b_suffix}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_owned).collect()
    }

    #[test]
    fn use_a_keeps_the_a_side() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = merge(&a, &b, |_, _, _| Choice::UseA);
        assert_eq!(result.merged_lines, lines("one\ntwo\nthree"));
        assert_eq!(result.conflicts, 1);
    }

    #[test]
    fn use_b_keeps_the_b_side() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = merge(&a, &b, |_, _, _| Choice::UseB);
        assert_eq!(result.merged_lines, lines("one\nTWO\nthree"));
    }

    #[test]
    fn use_both_concatenates_both_sides() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = merge(&a, &b, |_, _, _| Choice::UseBoth);
        assert_eq!(result.merged_lines, lines("one\ntwo\nTWO\nthree"));
    }

    #[test]
    fn skip_drops_the_block_entirely() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = merge(&a, &b, |_, _, _| Choice::Skip);
        assert_eq!(result.merged_lines, lines("one\nthree"));
    }

    #[test]
    fn identical_inputs_produce_no_conflicts() {
        let a = lines("one\ntwo\nthree");
        let result = merge(&a, &a, |_, _, _| Choice::UseA);
        assert_eq!(result.merged_lines, a);
        assert_eq!(result.conflicts, 0);
    }

    #[test]
    fn context_captures_up_to_three_surrounding_lines() {
        let a = lines("1\n2\n3\n4\n5\nCHANGED\n6\n7\n8\n9");
        let b = lines("1\n2\n3\n4\n5\nchanged\n6\n7\n8\n9");
        let mut seen_context = None;
        merge(&a, &b, |_, ctx, _| {
            seen_context = Some(ctx.clone());
            Choice::UseA
        });
        let ctx = seen_context.unwrap();
        assert_eq!(ctx.before, lines("3\n4\n5"));
        assert_eq!(ctx.after, lines("6\n7\n8"));
    }

    #[test]
    fn fallback_merge_emits_conflict_markers_with_both_labels() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = fallback_merge(&a, &b);
        assert!(result.merged_lines.contains(&"<<<<<<< Version 1".to_string()));
        assert!(result.merged_lines.contains(&"=======".to_string()));
        assert!(result.merged_lines.contains(&">>>>>>> Version 2".to_string()));
        assert!(result.merged_lines.contains(&"two".to_string()));
        assert!(result.merged_lines.contains(&"TWO".to_string()));
    }

    #[test]
    fn fallback_merge_labels_pure_delete_as_deleted() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nthree");
        let result = fallback_merge(&a, &b);
        assert!(result.merged_lines.contains(&"<<<<<<< Version 1 (deleted)".to_string()));
        assert!(result.merged_lines.contains(&">>>>>>> Version 2 (not present)".to_string()));
        assert!(result.merged_lines.contains(&"two".to_string()));
    }

    #[test]
    fn fallback_merge_labels_pure_insert_as_added() {
        let a = lines("one\nthree");
        let b = lines("one\ntwo\nthree");
        let result = fallback_merge(&a, &b);
        assert!(result.merged_lines.contains(&"<<<<<<< Version 1 (not present)".to_string()));
        assert!(result.merged_lines.contains(&">>>>>>> Version 2 (added)".to_string()));
        assert!(result.merged_lines.contains(&"two".to_string()));
    }

    #[test]
    fn fallback_merge_replace_block_gets_bare_markers() {
        let a = lines("one\ntwo\nthree");
        let b = lines("one\nTWO\nthree");
        let result = fallback_merge(&a, &b);
        assert!(result.merged_lines.contains(&"<<<<<<< Version 1".to_string()));
        assert!(result.merged_lines.contains(&">>>>>>> Version 2".to_string()));
    }
}
