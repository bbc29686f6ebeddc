//! Branch housekeeping: delete, rename, checkout, list.

use gitflow_git::Repository;

use crate::branch_name::BranchName;
use crate::config;
use crate::error::{Error, Result};
use crate::state::State;
use crate::topology::{BranchType, Config};

/// Flags for a delete operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Delete even if the branch is unmerged.
    pub force: bool,
    /// Also delete the remote branch.
    pub remote: bool,
}

/// Result of a delete operation.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// The deleted branch.
    pub full_branch_name: String,
    /// Whether the remote branch was deleted too.
    pub deleted_remote: bool,
}

/// Result of a rename operation.
#[derive(Debug)]
pub struct RenameOutcome {
    /// The old branch name.
    pub old_full_name: String,
    /// The new branch name.
    pub new_full_name: String,
}

/// Result of a checkout operation.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// A branch was checked out.
    CheckedOut(String),
    /// No argument was given; these topics of the type exist.
    Available(Vec<String>),
}

/// A branch reported by list/overview.
#[derive(Debug, Clone)]
pub struct ListedBranch {
    /// Name with the type prefix stripped.
    pub name: String,
    /// Concrete branch name.
    pub full_name: String,
    /// Whether this is the current branch.
    pub is_current: bool,
}

fn topic_type<'a>(config: &'a Config, branch_type: &str) -> Result<&'a BranchType> {
    config
        .find(branch_type)
        .filter(|b| b.is_topic())
        .ok_or_else(|| Error::InvalidBranchType(branch_type.to_string()))
}

fn guard_merge_state(state: &State) -> Result<()> {
    if state.merge_in_progress() {
        let pending = state.load_merge_state()?;
        return Err(Error::MergeInProgress {
            branch: pending.full_branch_name,
        });
    }
    Ok(())
}

/// Delete a topic branch, moving off it first when it is checked out.
///
/// The remote branch is deleted too when the `remote` flag or the type's
/// `deleteRemote` config key says so and a remote-tracking branch exists.
///
/// # Errors
/// Returns a taxonomy error for unknown types, missing branches, or a
/// non-forced delete of an unmerged branch.
pub fn delete(
    repo: &Repository,
    config: &Config,
    state: &State,
    branch_type: &str,
    name: &str,
    options: DeleteOptions,
) -> Result<DeleteOutcome> {
    config::ensure_initialized(repo)?;
    guard_merge_state(state)?;

    let branch = topic_type(config, branch_type)?;
    BranchName::new(name)?;
    let full = branch.full_name(name);

    if !repo.branch_exists(&full) {
        return Err(Error::BranchNotFound(full));
    }

    if repo.current_branch().ok().as_deref() == Some(full.as_str()) {
        if branch.parent.is_empty() {
            return Err(Error::InvalidBranchType(format!(
                "cannot delete '{full}' while it is checked out: '{}' has no parent",
                branch.name
            )));
        }
        if !repo.branch_exists(&branch.parent) {
            return Err(Error::BranchNotFound(branch.parent.clone()));
        }
        repo.checkout(&branch.parent)?;
    }

    repo.delete_branch(&full, options.force)?;

    let mut deleted_remote = false;
    if (options.remote || config::delete_remote_flag(repo, &branch.name)?)
        && repo.remote_branch_exists(&config.remote, &full)
    {
        repo.delete_remote_branch(&config.remote, &full)?;
        deleted_remote = true;
    }

    config::clear_branch_base(repo, &full)?;

    Ok(DeleteOutcome {
        full_branch_name: full,
        deleted_remote,
    })
}

/// Rename a topic branch. Does not touch the remote.
///
/// # Errors
/// Returns a taxonomy error for unknown types, an existing target name, or
/// a missing source branch.
pub fn rename(
    repo: &Repository,
    config: &Config,
    state: &State,
    branch_type: &str,
    old_name: Option<&str>,
    new_name: &str,
) -> Result<RenameOutcome> {
    config::ensure_initialized(repo)?;
    guard_merge_state(state)?;

    let branch = topic_type(config, branch_type)?;
    BranchName::new(new_name)?;
    let new_full = BranchName::new(branch.full_name(new_name))?.into_inner();

    if repo.branch_exists(&new_full) {
        return Err(Error::BranchExists(new_full));
    }

    let old_full = match old_name {
        Some(old) => branch.full_name(old),
        None => {
            let current = repo.current_branch()?;
            if !current.starts_with(&branch.prefix) {
                return Err(Error::InvalidBranchType(format!(
                    "current branch '{current}' is not a {} branch",
                    branch.name
                )));
            }
            current
        }
    };

    if !repo.branch_exists(&old_full) {
        return Err(Error::BranchNotFound(old_full));
    }

    if repo.current_branch().ok().as_deref() == Some(old_full.as_str()) {
        repo.rename_branch(&new_full, None)?;
    } else {
        repo.rename_branch(&new_full, Some(&old_full))?;
    }

    config::move_branch_base(repo, &old_full, &new_full)?;

    Ok(RenameOutcome {
        old_full_name: old_full,
        new_full_name: new_full,
    })
}

/// Checkout a topic branch, by exact name or unique prefix.
///
/// Without an argument, lists the topics of the type instead.
///
/// # Errors
/// Returns [`Error::BranchNotFound`] for zero matches and
/// [`Error::Ambiguous`] (listing the candidates) for more than one.
pub fn checkout(
    repo: &Repository,
    config: &Config,
    branch_type: &str,
    name: Option<&str>,
) -> Result<CheckoutOutcome> {
    config::ensure_initialized(repo)?;
    let branch = topic_type(config, branch_type)?;

    let Some(name) = name else {
        let names = list(repo, config, branch_type)?
            .into_iter()
            .map(|b| b.name)
            .collect();
        return Ok(CheckoutOutcome::Available(names));
    };

    let exact = branch.full_name(name);
    if repo.branch_exists(&exact) {
        repo.checkout(&exact)?;
        return Ok(CheckoutOutcome::CheckedOut(exact));
    }

    let mut candidates: Vec<String> = repo
        .list_branches()?
        .into_iter()
        .filter(|b| b.starts_with(&exact))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(Error::BranchNotFound(exact)),
        1 => {
            let target = candidates.remove(0);
            repo.checkout(&target)?;
            Ok(CheckoutOutcome::CheckedOut(target))
        }
        _ => Err(Error::Ambiguous {
            input: name.to_string(),
            candidates,
        }),
    }
}

/// List the branches of a topic type, prefix stripped, current marked.
///
/// # Errors
/// Returns [`Error::InvalidBranchType`] for unknown or base types.
pub fn list(repo: &Repository, config: &Config, branch_type: &str) -> Result<Vec<ListedBranch>> {
    config::ensure_initialized(repo)?;
    let branch = topic_type(config, branch_type)?;
    let current = repo.current_branch().ok();

    let mut listed: Vec<ListedBranch> = repo
        .list_branches()?
        .into_iter()
        .filter(|b| b.starts_with(&branch.prefix))
        .map(|full| ListedBranch {
            name: full[branch.prefix.len()..].to_string(),
            is_current: current.as_deref() == Some(full.as_str()),
            full_name: full,
        })
        .collect();
    listed.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(listed)
}
