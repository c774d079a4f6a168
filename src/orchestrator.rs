//! Iterative Merge Orchestrator: repeatedly merges the two most-similar
//! versions of a basename until one remains, fanning the result back out
//! to every original path.

use crate::error::CompletionResult;
use crate::fs::Filesystem;
use crate::grouper::FileGroup;
use crate::merger::MergeResult;
use crate::similarity;
use std::path::PathBuf;

const PLATFORM_NEWLINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// One completed merge step, for the caller's progress/summary UI.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_number: usize,
    pub path_a: PathBuf,
    pub path_b: PathBuf,
    pub similarity: f64,
    pub files_affected: usize,
    pub conflicts: usize,
    pub merged_line_count: usize,
}

/// Run the merge loop over every version of one basename.
///
/// - `status_cb` is informed before each merge attempt.
/// - `merge_cb` resolves one pair of line sequences into a `MergeResult`,
///   or returns `None` to cancel the whole run.
/// - `continue_cb` is asked after each successful operation whether to
///   proceed to the next one; returning `false` stops with `Incomplete`
///   while keeping everything already written to disk.
///
/// Writes are fanned out with no rollback on partial failure: a write
/// that fails for one path does not undo writes already made for
/// sibling paths in the same operation.
pub fn run_iterative_merge<M, C, S>(
    fs: &dyn Filesystem,
    groups: &[FileGroup],
    mut status_cb: S,
    mut merge_cb: M,
    mut continue_cb: C,
) -> (CompletionResult, Vec<OperationRecord>)
where
    M: FnMut(&[String], &[String]) -> Option<MergeResult>,
    C: FnMut(usize, usize) -> bool,
    S: FnMut(&FileGroup, &FileGroup, f64),
{
    let mut log = Vec::new();

    if groups.len() <= 1 {
        return (CompletionResult::NoMergingNeeded, log);
    }

    let mut current: Vec<FileGroup> = groups.to_vec();
    let mut lines_cache: Vec<Option<Vec<String>>> = vec![None; current.len()];
    let mut op_number = 0usize;

    loop {
        for (i, group) in current.iter().enumerate() {
            if lines_cache[i].is_none() {
                lines_cache[i] = Some(load_lines(fs, group));
            }
        }

        let Some((i, j, sim)) = most_similar_same_basename_pair(&current, &lines_cache) else {
            if op_number == 0 {
                return (CompletionResult::NoMergingNeeded, log);
            }
            let final_name = current[0].basename().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            return (CompletionResult::Success { final_file_name: final_name }, log);
        };

        status_cb(&current[i], &current[j], sim);

        let lines_a = lines_cache[i].clone().unwrap_or_default();
        let lines_b = lines_cache[j].clone().unwrap_or_default();

        let Some(result) = merge_cb(&lines_a, &lines_b) else {
            return (CompletionResult::Cancelled, log);
        };

        let content = if result.merged_lines.is_empty() {
            String::new()
        } else {
            let mut s = result.merged_lines.join(PLATFORM_NEWLINE);
            s.push_str(PLATFORM_NEWLINE);
            s
        };

        let mut affected_paths: Vec<PathBuf> = current[i].paths.clone();
        affected_paths.extend(current[j].paths.clone());

        let mut write_errors = 0usize;
        let mut access_denied: Option<String> = None;
        for path in &affected_paths {
            if let Err(e) = fs.write_all_text(path, &content) {
                tracing::warn!(path = %path.display(), error = %e, "fan-out write failed");
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    access_denied.get_or_insert_with(|| e.to_string());
                }
                write_errors += 1;
            }
        }

        if write_errors == affected_paths.len() {
            if let Some(message) = access_denied {
                return (CompletionResult::AccessDenied { message }, log);
            }
            return (
                CompletionResult::Error {
                    kind: "fan_out_write_failed".to_string(),
                    message: format!("all {} writes failed for this operation", affected_paths.len()),
                    partial: Some(result),
                },
                log,
            );
        }

        op_number += 1;
        log.push(OperationRecord {
            operation_number: op_number,
            path_a: current[i].paths.first().cloned().unwrap_or_default(),
            path_b: current[j].paths.first().cloned().unwrap_or_default(),
            similarity: sim,
            files_affected: affected_paths.len(),
            conflicts: result.conflicts,
            merged_line_count: result.merged_lines.len(),
        });

        let new_hash = crate::hash::hash_str(&content);
        let new_group = FileGroup { hash: new_hash, paths: affected_paths };
        let merged_lines = result.merged_lines;

        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        current.remove(hi);
        current.remove(lo);
        current.push(new_group);
        lines_cache.remove(hi);
        lines_cache.remove(lo);
        lines_cache.push(Some(merged_lines));

        if current.len() == 1 {
            let final_name =
                current[0].basename().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            return (CompletionResult::Success { final_file_name: final_name }, log);
        }

        if !continue_cb(op_number, current.len()) {
            return (CompletionResult::Incomplete, log);
        }
    }
}

fn load_lines(fs: &dyn Filesystem, group: &FileGroup) -> Vec<String> {
    let Some(path) = group.paths.first() else { return Vec::new() };
    fs.read_lines(path).unwrap_or_default()
}

/// Scan all unordered pairs of `current`, scoring only those whose
/// representative basenames match; a pair across two basenames is never
/// even scored. Ties break on lowest `(i, j)`.
fn most_similar_same_basename_pair(
    current: &[FileGroup],
    lines_cache: &[Option<Vec<String>>],
) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for i in 0..current.len() {
        for j in (i + 1)..current.len() {
            if current[i].basename() != current[j].basename() {
                continue;
            }
            let lines_i = lines_cache[i].as_deref().unwrap_or(&[]);
            let lines_j = lines_cache[j].as_deref().unwrap_or(&[]);
            let s = similarity::score(lines_i, lines_j);
            match best {
                Some((_, _, best_score)) if best_score >= s => {},
                _ => best = Some((i, j, s)),
            }
        }
    }
    best
}
