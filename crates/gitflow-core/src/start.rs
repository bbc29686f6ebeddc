//! Start: create a topic branch from its start point.

use gitflow_git::Repository;

use crate::branch_name::BranchName;
use crate::config;
use crate::error::{Error, Result};
use crate::state::State;
use crate::topology::Config;
use crate::update::checkout_if_needed;

/// Whether `start` fetches the remote first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Always fetch.
    Yes,
    /// Never fetch.
    No,
    /// Follow the `gitflow.fetch` config key (absent means no).
    #[default]
    Inherit,
}

/// Result of a start operation.
#[derive(Debug)]
pub struct StartOutcome {
    /// The created branch.
    pub full_branch_name: String,
    /// The branch it was created from.
    pub start_point: String,
    /// Whether the remote was fetched first.
    pub fetched: bool,
}

/// Create a new topic branch and check it out.
///
/// The start point (the type's `startPoint`, falling back to its parent) is
/// recorded under `gitflow.branch.<fullName>.base` so later operations can
/// recover the origin point.
///
/// # Errors
/// Returns a taxonomy error when the type is unknown or not a topic, the
/// name is invalid, the branch already exists, or the start point is
/// missing (which is also the empty-repository case).
pub fn run(
    repo: &Repository,
    config: &Config,
    state: &State,
    branch_type: &str,
    name: &str,
    fetch: FetchPolicy,
) -> Result<StartOutcome> {
    config::ensure_initialized(repo)?;
    if state.merge_in_progress() {
        let pending = state.load_merge_state()?;
        return Err(Error::MergeInProgress {
            branch: pending.full_branch_name,
        });
    }

    let branch = config
        .find(branch_type)
        .filter(|b| b.is_topic())
        .ok_or_else(|| Error::InvalidBranchType(branch_type.to_string()))?;

    BranchName::new(name)?;
    let full = BranchName::new(branch.full_name(name))?.into_inner();

    if repo.branch_exists(&full) {
        return Err(Error::BranchExists(full));
    }

    let start_point = branch.effective_start_point().to_string();
    if !repo.branch_exists(&start_point) {
        return Err(Error::BranchNotFound(start_point));
    }

    let fetched = match fetch {
        FetchPolicy::Yes => true,
        FetchPolicy::No => false,
        FetchPolicy::Inherit => config::auto_fetch(repo)?,
    };
    if fetched {
        repo.fetch(&config.remote)?;
    }

    repo.create_branch(&full, Some(&start_point))?;
    checkout_if_needed(repo, &full)?;
    config::record_branch_base(repo, &full, &start_point)?;

    Ok(StartOutcome {
        full_branch_name: full,
        start_point,
        fetched,
    })
}
