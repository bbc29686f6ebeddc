//! Error types for gitflow-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// A git command failed for a reason other than conflicts.
    #[error("git {op} failed: {cause}")]
    Command {
        /// The operation that failed (merge, rebase, tag, ...).
        op: &'static str,
        /// Stderr of the failed command, trimmed.
        cause: String,
    },

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error spawning the git binary.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
