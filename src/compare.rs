//! Directory Comparator: classifies same-named files across two roots
//! without touching `FileGroup`s or the merge pipeline.

use crate::differ;
use crate::fs::Filesystem;
use crate::walker;
use std::path::{Path, PathBuf};

/// Result of comparing every file matching `pattern` under two roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    /// Present in both, content identical (ignoring whitespace).
    pub same: Vec<PathBuf>,
    /// Present in both, content differs.
    pub modified: Vec<PathBuf>,
    /// Present only under `root_a`.
    pub only_in_a: Vec<PathBuf>,
    /// Present only under `root_b`.
    pub only_in_b: Vec<PathBuf>,
}

/// Compare two directory trees by relative path.
///
/// `recursive` controls whether subdirectories are descended into at
/// all; when `false`, only the root-level contents matching `pattern`
/// are compared. A common file that can't be read on either side is
/// classified as `modified` rather than dropped, since "couldn't tell"
/// is not the same claim as "identical".
pub fn compare(
    fs: &dyn Filesystem,
    root_a: &Path,
    root_b: &Path,
    pattern: &str,
    recursive: bool,
) -> ComparisonResult {
    let roots_a = vec![root_a.to_path_buf()];
    let roots_b = vec![root_b.to_path_buf()];

    let files_a = if recursive {
        walker::find(fs, &roots_a, pattern, &[], None)
    } else {
        shallow_find(fs, root_a, pattern)
    };
    let files_b = if recursive {
        walker::find(fs, &roots_b, pattern, &[], None)
    } else {
        shallow_find(fs, root_b, pattern)
    };

    let rel_a: std::collections::BTreeMap<PathBuf, PathBuf> = files_a
        .into_iter()
        .filter_map(|p| fs.to_relative(&p, root_a).map(|rel| (rel, p)))
        .collect();
    let rel_b: std::collections::BTreeMap<PathBuf, PathBuf> = files_b
        .into_iter()
        .filter_map(|p| fs.to_relative(&p, root_b).map(|rel| (rel, p)))
        .collect();

    let mut result = ComparisonResult::default();

    for (rel, path_a) in &rel_a {
        match rel_b.get(rel) {
            Some(path_b) => {
                let lines_a = fs.read_lines(path_a);
                let lines_b = fs.read_lines(path_b);
                match (lines_a, lines_b) {
                    (Ok(a), Ok(b)) if differ::identical(&a, &b) => result.same.push(rel.clone()),
                    _ => result.modified.push(rel.clone()),
                }
            },
            None => result.only_in_a.push(rel.clone()),
        }
    }

    for rel in rel_b.keys() {
        if !rel_a.contains_key(rel) {
            result.only_in_b.push(rel.clone());
        }
    }

    result
}

fn shallow_find(fs: &dyn Filesystem, root: &Path, pattern: &str) -> Vec<PathBuf> {
    let entries = fs.list_dir(root).unwrap_or_default();
    entries
        .into_iter()
        .filter(|e| !e.is_dir)
        .filter_map(|e| e.path.file_name().and_then(|n| n.to_str()).map(str::to_owned).map(|n| (e.path, n)))
        .filter(|(_, name)| name.eq_ignore_ascii_case(pattern) || glob_shallow_match(pattern, name))
        .map(|(path, _)| path)
        .collect()
}

fn glob_shallow_match(pattern: &str, name: &str) -> bool {
    if let (Some(prefix), Some(suffix)) = (pattern.split('*').next(), pattern.split('*').last()) {
        if pattern.contains('*') {
            return name.len() >= prefix.len() + suffix.len()
                && name.to_lowercase().starts_with(&prefix.to_lowercase())
                && name.to_lowercase().ends_with(&suffix.to_lowercase());
        }
    }
    false
}
