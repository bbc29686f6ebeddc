//! Error types for gitflow-core.
//!
//! One variant per user-visible failure kind; [`Error::exit_code`] maps each
//! kind to the process exit code the CLI reports.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gitflow-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The repository has no workflow configuration yet.
    #[error("gitflow is not initialized in this repository - run `git flow init` first")]
    NotInitialized,

    /// Init refused because a configuration already exists.
    #[error("gitflow is already initialized - use --force to reconfigure")]
    AlreadyInitialized,

    /// Unknown branch type, or a type unfit for the requested operation.
    #[error("invalid branch type: {0}")]
    InvalidBranchType(String),

    /// Invalid branch name.
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName {
        /// The invalid name.
        name: String,
        /// Why the name is invalid.
        reason: String,
    },

    /// The stored configuration violates a topology invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The working tree has uncommitted changes.
    #[error("working tree has uncommitted changes - commit or stash them first")]
    DirtyWorkingTree,

    /// A prefix argument matched more than one branch.
    #[error("'{input}' is ambiguous, matches: {}", candidates.join(", "))]
    Ambiguous {
        /// What the user typed.
        input: String,
        /// All branches it matched.
        candidates: Vec<String>,
    },

    /// A branch that must not exist already does.
    #[error("branch already exists: {0}")]
    BranchExists(String),

    /// A branch that must exist does not.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// A merge-like step stopped on conflicts; state was persisted.
    #[error("conflicts while merging on '{branch}'; {hint}")]
    UnresolvedConflicts {
        /// Branch carrying the conflict markers.
        branch: String,
        /// Literal continue/abort instructions.
        hint: String,
    },

    /// A persisted operation blocks this one.
    #[error("a merge is already in progress on '{branch}' - resolve it with --continue or --abort")]
    MergeInProgress {
        /// The branch named in the persisted state.
        branch: String,
    },

    /// --continue/--abort was given but no operation is in progress.
    #[error("no merge in progress")]
    NoMergeInProgress,

    /// The repository is mid-operation and git still owes a conclusion.
    #[error("an operation is still pending - conclude it with `{instruction}` and retry")]
    OperationPending {
        /// The git command that concludes the pending operation.
        instruction: String,
    },

    /// State file parsing error.
    #[error("failed to parse {}: {message}", file.display())]
    StateParse {
        /// The unreadable state file.
        file: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Git operation error.
    #[error(transparent)]
    Git(#[from] gitflow_git::Error),
}

impl Error {
    /// The process exit code for this error kind.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotInitialized => 1,
            Self::AlreadyInitialized
            | Self::InvalidBranchType(_)
            | Self::InvalidBranchName { .. }
            | Self::InvalidConfig(_)
            | Self::DirtyWorkingTree
            | Self::Ambiguous { .. }
            | Self::NoMergeInProgress
            | Self::OperationPending { .. } => 2,
            Self::StateParse { .. } | Self::Io(_) | Self::Json(_) | Self::Git(_) => 3,
            Self::BranchExists(_) => 4,
            Self::BranchNotFound(_) => 5,
            Self::UnresolvedConflicts { .. } | Self::MergeInProgress { .. } => 6,
        }
    }
}
