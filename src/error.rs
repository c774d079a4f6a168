//! Error taxonomy for the reconciliation pipeline.
//!
//! Per-file failures (a file that can't be hashed or read) are logged and
//! the file is dropped from the run; they never surface as an `Err` from
//! the batch-level entry points. Only whole-operation failures — a missing
//! root, an invalid exclusion pattern, a fan-out write that can't complete —
//! become a `ConfluxError`.

use crate::merger::MergeResult;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the reconciliation pipeline.
#[derive(Error, Debug)]
pub enum ConfluxError {
    #[error("directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    #[error("invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("pattern must not be empty")]
    EmptyPattern,

    #[error("failed to hash {path}: {source}")]
    Hash { path: PathBuf, #[source] source: std::io::Error },

    #[error("walk error under {path}: {source}")]
    Walk { path: PathBuf, #[source] source: std::io::Error },

    #[error("fan-out write failed for {path}: {source}")]
    FanOut { path: PathBuf, #[source] source: std::io::Error },

    #[error("batch root directory missing: {0}")]
    BatchRoot(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to (de)serialize batch configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Outcome of a single pairwise-merge orchestration run.
///
/// This is distinct from `Result<_, ConfluxError>` because several of
/// these outcomes (`Cancelled`, `Incomplete`, `NoMergingNeeded`) are not
/// errors — they are valid, expected terminal states of a merge session.
#[derive(Debug)]
pub enum CompletionResult {
    /// The run converged to a single file, written to every original path.
    Success { final_file_name: String },
    /// The user cancelled via `merge_cb` returning `None`.
    Cancelled,
    /// The user declined to continue via `continue_cb`; already-merged
    /// state is preserved on disk.
    Incomplete,
    /// A fan-out write failed partway through. `partial` carries the
    /// content that was produced so the caller can retry or recover.
    Error { kind: String, message: String, partial: Option<MergeResult> },
    /// A fan-out write failed due to access control specifically.
    AccessDenied { message: String },
    /// No same-basename pair existed; every file was already reconciled.
    NoMergingNeeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_human_readable() {
        let err = ConfluxError::DirectoryMissing(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "directory does not exist: /nope");
    }

    #[test]
    fn completion_result_variants_are_constructible() {
        let ok = CompletionResult::Success { final_file_name: "conf".into() };
        matches!(ok, CompletionResult::Success { .. });
        let none = CompletionResult::NoMergingNeeded;
        matches!(none, CompletionResult::NoMergingNeeded);
    }
}
