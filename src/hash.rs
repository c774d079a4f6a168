//! Content hashing: a stable fingerprint for file content.
//!
//! FNV-1a (64-bit) is the default algorithm: streamable, order-sensitive,
//! and fast — collision resistance isn't a requirement here, only
//! distinguishing distinct content under non-adversarial conditions. The
//! `sha256` feature swaps in SHA-256 instead. The two are never mixed
//! within a single run; `ContentHash` carries its own algorithm tag so a
//! stray comparison between hashes produced under different features
//! fails loudly rather than silently.

use crate::cancellation::CancellationToken;
use crate::fs::Filesystem;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A stable, lowercase-hex content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentHash {
    Fnv1a(u64),
    #[cfg(feature = "sha256")]
    Sha256([u8; 32]),
}

impl ContentHash {
    pub fn algorithm(&self) -> &'static str {
        match self {
            ContentHash::Fnv1a(_) => "FNV-1a",
            #[cfg(feature = "sha256")]
            ContentHash::Sha256(_) => "SHA-256",
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHash::Fnv1a(v) => write!(f, "{v:016x}"),
            #[cfg(feature = "sha256")]
            ContentHash::Sha256(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            },
        }
    }
}

/// Streaming hasher. Feed it bytes via `update`, then `finalize` once.
pub struct Hasher {
    inner: HasherImpl,
}

enum HasherImpl {
    Fnv1a(u64),
    #[cfg(feature = "sha256")]
    Sha256(sha2::Sha256),
}

impl Hasher {
    pub fn new() -> Self {
        #[cfg(not(feature = "sha256"))]
        {
            Self { inner: HasherImpl::Fnv1a(FNV_OFFSET_BASIS) }
        }
        #[cfg(feature = "sha256")]
        {
            use sha2::Digest;
            Self { inner: HasherImpl::Sha256(sha2::Sha256::new()) }
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            HasherImpl::Fnv1a(state) => {
                for &byte in data {
                    *state ^= u64::from(byte);
                    *state = state.wrapping_mul(FNV_PRIME);
                }
            },
            #[cfg(feature = "sha256")]
            HasherImpl::Sha256(hasher) => {
                use sha2::Digest;
                hasher.update(data);
            },
        }
    }

    pub fn finalize(self) -> ContentHash {
        match self.inner {
            HasherImpl::Fnv1a(state) => ContentHash::Fnv1a(state),
            #[cfg(feature = "sha256")]
            HasherImpl::Sha256(hasher) => {
                use sha2::Digest;
                let digest = hasher.finalize();
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&digest);
                ContentHash::Sha256(bytes)
            },
        }
    }

    /// Hash the contents of a file via the filesystem capability.
    pub fn hash_file(&mut self, fs: &dyn Filesystem, path: &Path) -> io::Result<()> {
        let data = fs.read_bytes(path)?;
        self.update(&data);
        Ok(())
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash_bytes(data: &[u8]) -> ContentHash {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn hash_file(fs: &dyn Filesystem, path: &Path) -> io::Result<ContentHash> {
    let mut hasher = Hasher::new();
    hasher.hash_file(fs, path)?;
    Ok(hasher.finalize())
}

/// Hash a string's UTF-8 bytes: encode then run the same byte loop used
/// for file content.
pub fn hash_str(data: &str) -> ContentHash {
    hash_bytes(data.as_bytes())
}

/// A simple counting semaphore used to bound `hash_many`'s concurrency.
struct Semaphore {
    state: Mutex<usize>,
    cv: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Self { state: Mutex::new(permits.max(1)), cv: Condvar::new() }
    }

    fn acquire(&self) {
        let mut guard = self.state.lock().unwrap();
        while *guard == 0 {
            guard = self.cv.wait(guard).unwrap();
        }
        *guard -= 1;
    }

    fn release(&self) {
        let mut guard = self.state.lock().unwrap();
        *guard += 1;
        self.cv.notify_one();
    }
}

/// Hash many files in parallel, throttled to at most `parallelism`
/// concurrent hashers (default: available parallelism). Per-file I/O
/// errors are collected separately rather than aborting the batch: the
/// caller decides whether to drop the file or abort.
///
/// Result ordering is not preserved; the map is keyed by path.
pub fn hash_many(
    fs: &dyn Filesystem,
    paths: &[PathBuf],
    parallelism: Option<usize>,
) -> (HashMap<PathBuf, ContentHash>, Vec<(PathBuf, io::Error)>) {
    hash_many_cancellable(fs, paths, parallelism, None)
}

/// Same as `hash_many`, but checks `token` before dispatching each file and
/// before each hasher starts work, so a cancellation signalled mid-scan
/// stops further tasks from being dispatched while in-flight ones still
/// finish.
pub fn hash_many_cancellable(
    fs: &dyn Filesystem,
    paths: &[PathBuf],
    parallelism: Option<usize>,
    token: Option<&CancellationToken>,
) -> (HashMap<PathBuf, ContentHash>, Vec<(PathBuf, io::Error)>) {
    let permits = parallelism
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
    let semaphore = Semaphore::new(permits);
    let results: Mutex<HashMap<PathBuf, ContentHash>> =
        Mutex::new(HashMap::with_capacity(paths.len()));
    let errors: Mutex<Vec<(PathBuf, io::Error)>> = Mutex::new(Vec::new());

    rayon::scope(|scope| {
        for path in paths {
            if token.is_some_and(CancellationToken::is_cancelled) {
                tracing::debug!("cancellation signalled, no further files dispatched");
                break;
            }
            scope.spawn(|_| {
                semaphore.acquire();
                if token.is_some_and(CancellationToken::is_cancelled) {
                    semaphore.release();
                    return;
                }
                let outcome = hash_file(fs, path);
                semaphore.release();
                match outcome {
                    Ok(hash) => {
                        results.lock().unwrap().insert(path.clone(), hash);
                    },
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "hash failed, dropping file");
                        errors.lock().unwrap().push((path.clone(), e));
                    },
                }
            });
        }
    });

    (results.into_inner().unwrap(), errors.into_inner().unwrap())
}
