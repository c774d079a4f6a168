//! Grouper: two-level partitioning by basename then content hash.
//!
//! This is the central safety invariant of the whole system: two paths
//! are only ever placed in the same group if they share a basename *and*
//! hash to the same content. `app.config` and `web.config` can never end
//! up in the same group even if byte-identical.

use crate::hash::{hash_many, ContentHash};
use crate::fs::Filesystem;
use ahash::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// One "version" of a basename: every path in `paths` currently holds
/// content that hashes to `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub hash: ContentHash,
    pub paths: Vec<PathBuf>,
}

impl FileGroup {
    pub fn basename(&self) -> Option<&std::ffi::OsStr> {
        self.paths.first().and_then(|p| p.file_name())
    }
}

/// Group discovered paths by basename, then by content hash within each
/// basename bucket. Paths whose content couldn't be hashed are dropped
/// (logged by `hash_many`) rather than aborting the whole grouping pass.
pub fn group(fs: &dyn Filesystem, paths: &[PathBuf], parallelism: Option<usize>) -> Vec<FileGroup> {
    let (hashes, _errors) = hash_many(fs, paths, parallelism);

    let mut by_basename: HashMap<OsString, Vec<&PathBuf>> = HashMap::default();
    for path in paths {
        if !hashes.contains_key(path) {
            continue;
        }
        let Some(name) = path.file_name() else { continue };
        by_basename.entry(name.to_os_string()).or_default().push(path);
    }

    let mut groups = Vec::new();
    for (_basename, bucket) in by_basename {
        let mut by_hash: HashMap<ContentHash, Vec<PathBuf>> = HashMap::default();
        for path in bucket {
            let hash = hashes[path].clone();
            by_hash.entry(hash).or_default().push(path.clone());
        }
        for (hash, paths) in by_hash {
            groups.push(FileGroup { hash, paths });
        }
    }

    groups
}
