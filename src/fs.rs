//! Filesystem capability interface.
//!
//! The core never calls `std::fs` primitives directly; every component
//! takes a `&dyn Filesystem` so that it can run
//! against a real OS directory tree or an in-memory fixture. `OsFilesystem`
//! is the production implementation; `MemoryFilesystem` backs the unit
//! tests that exercise the Walker, Grouper, and Orchestrator without
//! touching disk.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// A directory entry as seen by a `Filesystem` implementation.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// True when this entry is a regular *file* named `.git` — the
    /// submodule marker the Walker skips subtrees for.
    pub is_dotgit_file: bool,
}

/// Metadata needed by the Hasher and Batch Processor.
#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub size: u64,
    pub modified: SystemTime,
}

/// Capability interface for all filesystem access performed by the core.
pub trait Filesystem: Send + Sync {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let bytes = self.read_bytes(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.lines().map(str::to_owned).collect())
    }

    /// Atomic write-then-rename: callers never observe a truncated file.
    fn write_all_text(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Direct children of `path` (non-recursive); the Walker recurses by
    /// calling this repeatedly so it can apply exclusion/submodule logic
    /// between levels.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn to_relative(&self, path: &Path, root: &Path) -> Option<PathBuf> {
        path.strip_prefix(root).ok().map(Path::to_path_buf)
    }
}

/// The real filesystem, via `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_all_text(&self, path: &Path, contents: &str) -> io::Result<()> {
        let temp_path = sibling_temp_path(path);
        std::fs::write(&temp_path, contents.as_bytes())?;
        // fsync before rename so the rename can't outrun the data on crash.
        std::fs::File::open(&temp_path)?.sync_all()?;
        std::fs::rename(&temp_path, path)?;
        fsync_directory(path)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let entry_path = entry.path();
            let is_dotgit_file = file_type.is_file()
                && entry_path.file_name().and_then(|n| n.to_str()) == Some(".git");
            out.push(DirEntry {
                path: entry_path,
                is_dir: file_type.is_dir(),
                is_dotgit_file,
            });
        }
        Ok(out)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = std::fs::metadata(path)?;
        Ok(FileStat { size: meta.len(), modified: meta.modified()? })
    }
}

/// Copy `(source, destination)` pairs in parallel via `write_all_text`'s
/// atomic write path, reusing it instead of a raw `std::fs::copy` so a
/// crash mid-copy never leaves a destination half-written. Exposed as a
/// primitive for a future bulk-sync entry point; no CLI subcommand wires
/// it up yet. Per-pair failures are collected rather than
/// aborting the whole batch, matching `hash_many`'s policy.
pub fn copy_many_parallel(
    fs: &dyn Filesystem,
    pairs: &[(PathBuf, PathBuf)],
) -> Vec<(PathBuf, io::Error)> {
    let errors: Mutex<Vec<(PathBuf, io::Error)>> = Mutex::new(Vec::new());
    rayon::scope(|scope| {
        for (source, destination) in pairs {
            scope.spawn(|_| {
                if let Err(e) = copy_one(fs, source, destination) {
                    errors.lock().unwrap().push((destination.clone(), e));
                }
            });
        }
    });
    errors.into_inner().unwrap()
}

fn copy_one(fs: &dyn Filesystem, source: &Path, destination: &Path) -> io::Result<()> {
    let bytes = fs.read_bytes(source)?;
    let text = String::from_utf8_lossy(&bytes);
    fs.write_all_text(destination, &text)
}

/// Flush the directory entry for `path`'s parent so the rename itself
/// survives a crash, not just the data it points to. No-op on Windows,
/// where directory handles can't be opened for fsync.
fn fsync_directory(path: &Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else { return Ok(()) };
    #[cfg(unix)]
    std::fs::File::open(parent)?.sync_all()?;
    #[cfg(not(unix))]
    let _ = parent;
    Ok(())
}

fn sibling_temp_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("tmp");
    let pid = std::process::id();
    let nonce: u32 = rand::random();
    path.with_file_name(format!(".{file_name}.{pid}-{nonce:08x}.tmp"))
}

/// An in-memory filesystem fixture, used by unit tests.
///
/// Paths are stored verbatim (no normalization beyond what `PathBuf`
/// already does); directories are implicit — any path that is a strict
/// prefix of a stored file is treated as a directory.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.lock().unwrap().insert(path.into(), contents.into());
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(path.into(), contents.into());
    }

    pub fn mark_submodule(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.files.lock().unwrap().insert(dir.join(".git"), b"gitdir: ../.git/modules/x\n".to_vec());
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write_all_text(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path) && p != path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        !files.contains_key(path) && files.keys().any(|p| p.starts_with(path) && p != path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let files = self.files.lock().unwrap();
        let mut seen = std::collections::BTreeSet::new();
        let mut out = Vec::new();
        for key in files.keys() {
            let Ok(rest) = key.strip_prefix(path) else { continue };
            let mut components = rest.components();
            let Some(first) = components.next() else { continue };
            let child = path.join(first);
            if !seen.insert(child.clone()) {
                continue;
            }
            let is_dir = components.next().is_some() || {
                // A single-component child is a directory only if some
                // *other* stored key extends past it.
                files.keys().any(|k| k != &child && k.starts_with(&child))
            };
            let is_dotgit_file =
                !is_dir && child.file_name().and_then(|n| n.to_str()) == Some(".git");
            out.push(DirEntry { path: child, is_dir, is_dotgit_file });
        }
        Ok(out)
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let files = self.files.lock().unwrap();
        let data = files
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        Ok(FileStat { size: data.len() as u64, modified: SystemTime::UNIX_EPOCH })
    }
}
