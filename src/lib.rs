//! Reconciles diverging copies of same-named files scattered across a
//! directory tree by iteratively merging the most-similar pair until one
//! version remains, then writing that version back to every original
//! location.

pub mod batch;
pub mod cancellation;
pub mod compare;
pub mod differ;
pub mod error;
pub mod fs;
pub mod grouper;
pub mod hash;
pub mod merger;
pub mod orchestrator;
pub mod similarity;
pub mod tempfile_helper;
pub mod walker;

pub use batch::{BatchConfiguration, ResolutionItem, ResolutionType};
pub use cancellation::CancellationToken;
pub use compare::{compare as compare_directories, ComparisonResult};
pub use differ::{diff, identical, line_differences, render_unified_diff, DiffBlock, LineDifference};
pub use error::{CompletionResult, ConfluxError};
pub use fs::{Filesystem, MemoryFilesystem, OsFilesystem};
pub use grouper::{group, FileGroup};
pub use hash::{hash_bytes, hash_file, hash_many, hash_str, ContentHash, Hasher};
pub use merger::{fallback_merge, merge, BlockContext, Choice, MergeResult};
pub use orchestrator::{run_iterative_merge, OperationRecord};
pub use similarity::score as similarity_score;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
