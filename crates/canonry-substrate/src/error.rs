use std::path::PathBuf;

use thiserror::Error;

/// Errors from substrate access.
///
/// Substrate failures surface verbatim and abort the operation that
/// triggered them; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum SubstrateError {
    /// The named ref does not resolve to a snapshot.
    #[error("ref not found: {ref_name}")]
    RefNotFound { ref_name: String },

    /// The project path is not inside a repository.
    #[error("not a repository: {path}")]
    NotARepository { path: PathBuf },

    /// A commit raced with an intervening change and was refused.
    #[error("concurrent modification: {detail}")]
    ConcurrentModification { detail: String },

    /// A tree move would clobber existing entries or has nothing to move.
    #[error("invalid move {from} -> {to}: {reason}")]
    InvalidMove {
        from: String,
        to: String,
        reason: String,
    },

    /// The git binary is not installed or not on PATH.
    #[error("git is not installed or not on PATH")]
    GitUnavailable,

    /// A git command failed.
    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for substrate operations.
pub type SubstrateResult<T> = Result<T, SubstrateError>;
