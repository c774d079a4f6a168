//! Temp-File Helper: RAII scoped acquisition of a writable temp path,
//! with collision retry and a write-permission preflight.

use crate::error::ConfluxError;
use crate::fs::Filesystem;
use rand::Rng;
use std::path::{Path, PathBuf};

const MAX_RETRIES: usize = 100;
const NAME_LEN: usize = 16;
const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A temp file path reserved for the caller's exclusive use. Dropping it
/// removes the file if it still exists, on every exit path including a
/// panic unwind.
pub struct TempFileGuard<'a> {
    fs: &'a dyn Filesystem,
    path: PathBuf,
    released: bool,
}

impl<'a> TempFileGuard<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file past the guard's lifetime (e.g. after a successful
    /// rename into place made it no longer temporary).
    pub fn release(mut self) {
        self.released = true;
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.fs.remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "temp file cleanup failed");
        }
    }
}

fn random_name() -> String {
    let mut rng = rand::rng();
    (0..NAME_LEN).map(|_| NAME_ALPHABET[rng.random_range(0..NAME_ALPHABET.len())] as char).collect()
}

/// Confirm `dir` is writable by writing and immediately deleting a probe
/// file, before any real work depends on it.
fn preflight(fs: &dyn Filesystem, dir: &Path) -> Result<(), ConfluxError> {
    let probe = dir.join(format!(".conflux-preflight-{}", random_name()));
    fs.write_all_text(&probe, "").map_err(ConfluxError::Io)?;
    let _ = fs.remove_file(&probe);
    Ok(())
}

/// Reserve a unique temp file path under `dir`, retrying on name
/// collision up to `MAX_RETRIES` times with a fresh cryptographically
/// random name each time.
pub fn acquire<'a>(fs: &'a dyn Filesystem, dir: &Path) -> Result<TempFileGuard<'a>, ConfluxError> {
    preflight(fs, dir)?;

    for _ in 0..MAX_RETRIES {
        let candidate = dir.join(format!(".conflux-{}.tmp", random_name()));
        if !fs.exists(&candidate) {
            fs.write_all_text(&candidate, "").map_err(ConfluxError::Io)?;
            return Ok(TempFileGuard { fs, path: candidate, released: false });
        }
    }

    Err(ConfluxError::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("could not allocate a unique temp file under {} after {MAX_RETRIES} attempts", dir.display()),
    )))
}
