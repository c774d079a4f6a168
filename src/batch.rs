//! Batch Processor: runs the gather → hash → group → resolve pipeline
//! over a saved set of search patterns.
//!
//! Two processing paths are exposed. `process_batch` runs all four
//! phases across every pattern before resolving anything — the default,
//! since it lets `skip_empty_patterns` and hashing run in one pass.
//! `process_batch_legacy` instead runs all four phases per pattern,
//! prompting between patterns when `prompt_before_each_pattern` is set;
//! it must produce the same resolutions, just interleaved.

use crate::differ;
use crate::fs::Filesystem;
use crate::grouper::{self, FileGroup};
use crate::walker;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A saved, reusable set of search patterns and exclusions. This is
/// the only structure in the pipeline that gets persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfiguration {
    pub name: String,
    pub description: String,
    pub file_patterns: Vec<String>,
    pub search_paths: Vec<PathBuf>,
    pub path_exclusion_patterns: Vec<String>,
    pub skip_empty_patterns: bool,
    pub prompt_before_each_pattern: bool,
    /// RFC 3339 timestamp of the last time this configuration was run,
    /// if ever. Stored as an opaque string rather than a typed timestamp
    /// so this crate doesn't need to pull in a datetime dependency only
    /// a single optional field actually uses.
    pub last_modified: Option<String>,
}

/// Default directory for saved batch configurations, following platform
/// convention (e.g. `~/.config/conflux` on Linux).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("conflux"))
}

impl BatchConfiguration {
    pub fn load(fs: &dyn Filesystem, path: &std::path::Path) -> Result<Self, crate::error::ConfluxError> {
        let bytes = fs.read_bytes(path)?;
        serde_json::from_slice(&bytes).map_err(crate::error::ConfluxError::Config)
    }

    pub fn save(&self, fs: &dyn Filesystem, path: &std::path::Path) -> Result<(), crate::error::ConfluxError> {
        let json = serde_json::to_string_pretty(self)?;
        fs.write_all_text(path, &json)?;
        Ok(())
    }
}

/// How a basename's collected versions resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionType {
    /// A pattern matched zero files and `skip_empty_patterns` was false.
    Empty,
    /// Exactly one file found for this basename.
    SingleFile,
    /// More than one file found, all byte-for-byte identical content.
    Identical,
    /// More than one distinct version found; needs a merge.
    Merge,
}

#[derive(Debug, Clone)]
pub struct ResolutionItem {
    /// The basename for `SingleFile`/`Identical`/`Merge`; the pattern
    /// string itself for `Empty`, since there's no file to name one from.
    pub basename: String,
    pub groups: Vec<FileGroup>,
    pub resolution_type: ResolutionType,
}

fn classify(fs: &dyn Filesystem, groups: Vec<FileGroup>) -> Option<ResolutionItem> {
    let basename = groups.first()?.basename()?.to_string_lossy().into_owned();
    let total_paths: usize = groups.iter().map(|g| g.paths.len()).sum();
    let resolution_type = if total_paths <= 1 {
        ResolutionType::SingleFile
    } else if groups.len() == 1 {
        ResolutionType::Identical
    } else {
        ResolutionType::Merge
    };

    if resolution_type == ResolutionType::Merge && groups.len() == 2 {
        log_if_whitespace_only_divergence(fs, &basename, &groups[0], &groups[1]);
    }

    Some(ResolutionItem { basename, groups, resolution_type })
}

/// Diagnostic only: hints that a `Merge` item's two versions differ by
/// whitespace alone. Doesn't change `resolution_type` or skip the user's
/// chosen resolution path — just saves someone staring at a diff full of
/// invisible changes.
fn log_if_whitespace_only_divergence(fs: &dyn Filesystem, basename: &str, a: &FileGroup, b: &FileGroup) {
    let (Some(path_a), Some(path_b)) = (a.paths.first(), b.paths.first()) else { return };
    let (Ok(lines_a), Ok(lines_b)) = (fs.read_lines(path_a), fs.read_lines(path_b)) else { return };
    if differ::diff(&lines_a, &lines_b, true).is_empty() {
        tracing::debug!(basename, "near-identical, differs only in whitespace");
    }
}

fn gather_pattern(fs: &dyn Filesystem, config: &BatchConfiguration, pattern: &str) -> Vec<PathBuf> {
    walker::find(fs, &config.search_paths, pattern, &config.path_exclusion_patterns, None)
}

fn group_by_basename(fs: &dyn Filesystem, groups: Vec<FileGroup>) -> Vec<ResolutionItem> {
    use ahash::HashMap;
    let mut by_basename: HashMap<String, Vec<FileGroup>> = HashMap::default();
    for group in groups {
        let Some(name) = group.basename().map(|n| n.to_string_lossy().into_owned()) else { continue };
        by_basename.entry(name).or_default().push(group);
    }
    by_basename.into_values().filter_map(|groups| classify(fs, groups)).collect()
}

/// Gather every pattern's files first, hash and group them all together,
/// then resolve. This is the default 4-phase path.
pub fn process_batch(
    fs: &dyn Filesystem,
    config: &BatchConfiguration,
    parallelism: Option<usize>,
) -> Vec<ResolutionItem> {
    let mut all_paths = Vec::new();
    let mut empty_items = Vec::new();
    for pattern in &config.file_patterns {
        let found = gather_pattern(fs, config, pattern);
        if found.is_empty() {
            if config.skip_empty_patterns {
                tracing::debug!(pattern, "no matches, skipping per skip_empty_patterns");
            } else {
                empty_items.push(empty_item(pattern));
            }
            continue;
        }
        all_paths.extend(found);
    }

    let groups = grouper::group(fs, &all_paths, parallelism);
    let mut items = group_by_basename(fs, groups);
    items.extend(empty_items);
    items
}

fn empty_item(pattern: &str) -> ResolutionItem {
    ResolutionItem { basename: pattern.to_string(), groups: Vec::new(), resolution_type: ResolutionType::Empty }
}

/// Run gather → hash → group → resolve per pattern, in sequence, calling
/// `on_pattern_start` before each one (the hook that implements
/// `prompt_before_each_pattern` at the caller's discretion — returning
/// `false` skips that pattern entirely).
pub fn process_batch_legacy<F>(
    fs: &dyn Filesystem,
    config: &BatchConfiguration,
    parallelism: Option<usize>,
    mut on_pattern_start: F,
) -> Vec<ResolutionItem>
where
    F: FnMut(&str) -> bool,
{
    let mut out = Vec::new();
    for pattern in &config.file_patterns {
        if config.prompt_before_each_pattern && !on_pattern_start(pattern) {
            continue;
        }
        let found = gather_pattern(fs, config, pattern);
        if found.is_empty() {
            if config.skip_empty_patterns {
                tracing::debug!(pattern, "no matches, skipping per skip_empty_patterns");
            } else {
                out.push(empty_item(pattern));
            }
            continue;
        }
        let groups = grouper::group(fs, &found, parallelism);
        out.extend(group_by_basename(fs, groups));
    }
    out
}
