//! File Walker: recursive discovery with glob exclusions and submodule
//! skipping.
//!
//! Matching is deliberately hand-rolled rather than delegated to a
//! gitignore-style crate: the exclusion semantics here (interior
//! component match, substring match, prefix match, regex fallback) are
//! specific to this spec and don't map onto `.gitignore` matching rules.

use crate::fs::Filesystem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const REGEX_TIMEOUT: Duration = Duration::from_secs(1);

/// Recursively enumerate files under `roots` whose basename matches
/// `pattern`, skipping submodules and any subdirectory matched by
/// `exclusions`. `on_progress`, if given, is called once per discovered
/// file; it must be cheap — it runs inline on the walking thread.
pub fn find(
    fs: &dyn Filesystem,
    roots: &[PathBuf],
    pattern: &str,
    exclusions: &[String],
    mut on_progress: Option<&mut dyn FnMut(&Path)>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for root in roots {
        walk_dir(fs, root, pattern, exclusions, &mut out, &mut on_progress);
    }
    out
}

fn walk_dir(
    fs: &dyn Filesystem,
    dir: &Path,
    pattern: &str,
    exclusions: &[String],
    out: &mut Vec<PathBuf>,
    on_progress: &mut Option<&mut dyn FnMut(&Path)>,
) {
    let entries = match fs.list_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable subtree");
            return;
        },
    };

    if entries.iter().any(|e| e.is_dotgit_file) {
        tracing::debug!(dir = %dir.display(), "skipping submodule checkout");
        return;
    }

    for entry in entries {
        if entry.is_dir {
            let normalized = normalize_slashes(&entry.path);
            if exclusions.iter().any(|pat| exclusion_matches(pat, &normalized)) {
                tracing::debug!(dir = %entry.path.display(), "excluded by pattern");
                continue;
            }
            walk_dir(fs, &entry.path, pattern, exclusions, out, on_progress);
        } else {
            let Some(name) = entry.path.file_name().and_then(|n| n.to_str()) else { continue };
            if basename_matches(pattern, name) {
                if let Some(cb) = on_progress.as_mut() {
                    cb(&entry.path);
                }
                out.push(entry.path);
            }
        }
    }
}

fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Match a basename against a glob `pattern` (`*` → any run of chars,
/// `?` → any single char), case-insensitively.
fn basename_matches(pattern: &str, name: &str) -> bool {
    match compile_glob(pattern) {
        Some(re) => re.is_match(name),
        None => name.eq_ignore_ascii_case(pattern),
    }
}

fn compile_glob(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern);
    let translated = escaped.replace("\\*", ".*").replace("\\?", ".");
    Regex::new(&format!("(?i)^{translated}$")).ok()
}

/// Match an exclusion `pattern` against a forward-slash-normalized
/// absolute path, recognizing three shorthand forms plus a DoS-safe
/// regex fallback.
fn exclusion_matches(pattern: &str, normalized_path: &str) -> bool {
    let components: Vec<&str> = normalized_path.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(middle) = interior_component_pattern(pattern) {
        return components.iter().any(|c| c.eq_ignore_ascii_case(middle));
    }

    if !pattern.contains('/') {
        if let Some(needle) = pattern.strip_prefix('*').and_then(|p| p.strip_suffix('*')) {
            if !needle.is_empty() {
                return components.iter().any(|c| c.to_lowercase().contains(&needle.to_lowercase()));
            }
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            if !pattern.starts_with('*') && !prefix.is_empty() {
                return components
                    .iter()
                    .any(|c| c.to_lowercase().starts_with(&prefix.to_lowercase()));
            }
        }
    }

    regex_exclusion_match(pattern, normalized_path)
}

/// Recognizes the `*/name/*` shorthand: "any interior directory component
/// equals `name`".
fn interior_component_pattern(pattern: &str) -> Option<&str> {
    let inner = pattern.strip_prefix("*/")?.strip_suffix("/*")?;
    if inner.is_empty() || inner.contains(['*', '?', '/']) {
        None
    } else {
        Some(inner)
    }
}

/// Anchored-regex fallback, run with a hard wall-clock budget. Rust's
/// `regex` crate is a finite-automaton engine with no catastrophic-
/// backtracking failure mode, but the budget is kept anyway as
/// defense-in-depth. On
/// construction failure or timeout, fall back to a metacharacter-stripped
/// substring match.
fn regex_exclusion_match(pattern: &str, normalized_path: &str) -> bool {
    let translated = format!("^{}$", regex::escape(pattern).replace("\\*", ".*").replace("\\?", "."));

    let Ok(re) = Regex::new(&translated) else {
        return substring_fallback(pattern, normalized_path);
    };

    match run_with_timeout(re, normalized_path.to_string(), REGEX_TIMEOUT) {
        Some(matched) => matched,
        None => {
            tracing::warn!(pattern, "exclusion regex exceeded time budget, falling back");
            substring_fallback(pattern, normalized_path)
        },
    }
}

fn run_with_timeout(re: Regex, text: String, timeout: Duration) -> Option<bool> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let matched = re.is_match(&text);
        let _ = tx.send(matched);
    });
    rx.recv_timeout(timeout).ok()
}

fn substring_fallback(pattern: &str, haystack: &str) -> bool {
    let stripped: String = pattern.chars().filter(|c| !"*?.[](){}^$+\\|".contains(*c)).collect();
    if stripped.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&stripped.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFilesystem;

    #[test]
    fn finds_matching_basenames_under_multiple_roots() {
        let fs = MemoryFilesystem::new()
            .with_file("/a/conf.yaml", b"1".to_vec())
            .with_file("/b/conf.yaml", b"2".to_vec())
            .with_file("/b/other.yaml", b"3".to_vec());
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let mut found = find(&fs, &roots, "conf.yaml", &[], None);
        found.sort();
        assert_eq!(found, vec![PathBuf::from("/a/conf.yaml"), PathBuf::from("/b/conf.yaml")]);
    }

    #[test]
    fn glob_pattern_matches_basename() {
        let fs = MemoryFilesystem::new()
            .with_file("/a/app.config", b"1".to_vec())
            .with_file("/a/readme.md", b"2".to_vec());
        let found = find(&fs, &[PathBuf::from("/a")], "*.config", &[], None);
        assert_eq!(found, vec![PathBuf::from("/a/app.config")]);
    }

    #[test]
    fn submodule_directories_are_skipped_entirely() {
        let fs = MemoryFilesystem::new().with_file("/root/sub/target.txt", b"x".to_vec());
        fs.mark_submodule("/root/sub");
        let found = find(&fs, &[PathBuf::from("/root")], "target.txt", &[], None);
        assert!(found.is_empty(), "submodule subtree must yield zero files");
    }

    #[test]
    fn interior_component_exclusion_skips_nested_bin_dirs() {
        let fs = MemoryFilesystem::new()
            .with_file("/src/a.cs", b"1".to_vec())
            .with_file("/src/bin/a.cs", b"2".to_vec())
            .with_file("/node_modules/pkg/a.cs", b"3".to_vec());
        let excludes = vec!["*/bin/*".to_string(), "*node_modules*".to_string()];
        let mut found = find(&fs, &[PathBuf::from("/")], "*.cs", &excludes, None);
        found.sort();
        assert_eq!(found, vec![PathBuf::from("/src/a.cs")]);
    }

    #[test]
    fn prefix_exclusion_matches_any_component() {
        let fs = MemoryFilesystem::new()
            .with_file("/build-output/x.txt", b"1".to_vec())
            .with_file("/keep/x.txt", b"2".to_vec());
        let found = find(&fs, &[PathBuf::from("/")], "x.txt", &["build*".to_string()], None);
        assert_eq!(found, vec![PathBuf::from("/keep/x.txt")]);
    }

    #[test]
    fn on_progress_is_invoked_once_per_file() {
        let fs = MemoryFilesystem::new()
            .with_file("/a/one.txt", b"1".to_vec())
            .with_file("/a/two.txt", b"2".to_vec());
        let mut seen = Vec::new();
        {
            let mut cb = |p: &Path| seen.push(p.to_path_buf());
            find(&fs, &[PathBuf::from("/a")], "*.txt", &[], Some(&mut cb));
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn regex_fallback_matches_dotted_basenames() {
        let fs = MemoryFilesystem::new().with_file("/a/file.v1.txt", b"1".to_vec());
        let found = find(&fs, &[PathBuf::from("/a")], "file.v1.txt", &[], None);
        assert_eq!(found, vec![PathBuf::from("/a/file.v1.txt")]);
    }

    #[test]
    fn unreadable_subdirectory_is_swallowed_not_fatal() {
        // MemoryFilesystem's list_dir never errors on a present directory;
        // this exercises the "missing root" path instead, which returns
        // an empty listing rather than panicking.
        let fs = MemoryFilesystem::new();
        let found = find(&fs, &[PathBuf::from("/does/not/exist")], "*.txt", &[], None);
        assert!(found.is_empty());
    }
}
