//! # gitflow-core
//!
//! Core library for gitflow: the branch topology model, the configuration
//! store over the repository's key-value config, the persisted operation
//! state, and the workflow engine (start, finish, update, delete, rename,
//! checkout, list, overview).

pub mod branch;
pub mod config;
pub mod finish;
pub mod init;
pub mod overview;
pub mod start;
pub mod update;

mod branch_name;
mod error;
mod state;
mod topology;

#[cfg(test)]
mod testutil;

pub use branch_name::BranchName;
pub use error::{Error, Result};
pub use state::{Action, MergeState, RetentionOptions, State, Step, TagOptions};
pub use topology::{BranchKind, BranchType, Config, Overrides, Strategy};
