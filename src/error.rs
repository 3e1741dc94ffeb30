//! Error taxonomy for the core (§7 of the specification).
//!
//! `AbsentValue` and `OutOfRangeNode` are deliberately absent from this
//! enum: lookups are total, and both surface as `None` at the API
//! instead of an `Err`. Everything here is a load-path or boundary
//! failure, never a read-path one.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling, loading or otherwise managing a
/// Context-Fabric cache directory.
#[derive(Debug, Error)]
pub enum Error {
    /// A feature name was requested that does not appear in the manifest.
    #[error("unknown feature {0:?}")]
    UnknownFeature(String),

    /// A cache file disagreed with what the manifest declared for it
    /// (length, dtype, or structural invariant).
    #[error("corrupt cache at {path:?}: {reason}")]
    CorruptCache { path: PathBuf, reason: String },

    /// The cache's format version is below the loader's minimum
    /// supported version, or above what this loader understands.
    #[error("cache format version mismatch: cache has {found}, loader needs {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    /// The compiler's input source was malformed; the partial temporary
    /// cache has been discarded and the previous cache, if any, remains
    /// authoritative.
    #[error("compilation failed: {0}")]
    CompilerFailure(String),

    /// Two processes raced to compile into the same cache directory;
    /// the loser of the rename-into-place discards its temporary work.
    #[error("concurrent compile detected for cache directory {0:?}")]
    ConcurrentWrite(PathBuf),

    /// I/O failure at a load or compile boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest (de)serialization failure.
    #[error("manifest (de)serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
