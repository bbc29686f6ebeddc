//! # gitflow-git
//!
//! Git operations abstraction layer for gitflow, built on git2-rs.
//! Provides typed operations for branch management, merging, rebasing,
//! tagging, and repository configuration access.

mod error;
mod repository;

pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::{MergeOutcome, RebaseOutcome, Repository, TagOptions};
