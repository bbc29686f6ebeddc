//! Update: apply parent changes to a branch with its downstream strategy.
//!
//! Also home of the strategy-application helper shared with the finish
//! cascade, and the continue/abort plumbing for a paused update.

use gitflow_git::{MergeOutcome, RebaseOutcome, Repository};

use crate::config;
use crate::error::{Error, Result};
use crate::state::{Action, MergeState, State, Step};
use crate::topology::{Config, Strategy};

/// Result of an update operation.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The branch already contained its parent's tip.
    AlreadyUpToDate {
        /// The updated branch.
        branch: String,
        /// The parent it was compared against.
        parent: String,
    },
    /// Parent changes were applied.
    Updated {
        /// The updated branch.
        branch: String,
        /// The parent the changes came from.
        parent: String,
    },
}

/// What a strategy application did on the current branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// Changes were brought in.
    Done,
    /// Nothing to do.
    UpToDate,
    /// Stopped on conflicts.
    Conflicts,
}

/// Apply a strategy pulling `source` into the current branch.
///
/// Strategies are idempotent when re-applied after the user concluded them
/// by hand: a completed merge reports up-to-date and a completed rebase has
/// nothing to replay. That is what makes blind re-entry on `--continue`
/// safe. The exception is squash, which cannot be re-run; a resolved squash
/// left staged by an earlier stop is concluded with a commit instead.
pub(crate) fn apply_strategy(
    repo: &Repository,
    source: &str,
    strategy: Strategy,
) -> Result<Applied> {
    match strategy {
        Strategy::Rebase => Ok(match repo.rebase(source)? {
            RebaseOutcome::Completed => Applied::Done,
            RebaseOutcome::Conflicts => Applied::Conflicts,
        }),
        Strategy::Squash => {
            if repo.has_staged_changes()? {
                repo.commit_staged()?;
                return Ok(Applied::Done);
            }
            Ok(match repo.squash_merge(source)? {
                MergeOutcome::Completed => Applied::Done,
                MergeOutcome::UpToDate => Applied::UpToDate,
                MergeOutcome::Conflicts => Applied::Conflicts,
            })
        }
        // Downstream `none` means the branch does not follow its parent.
        Strategy::None => Ok(Applied::UpToDate),
        Strategy::Merge => Ok(match repo.merge(source)? {
            MergeOutcome::Completed => Applied::Done,
            MergeOutcome::UpToDate => Applied::UpToDate,
            MergeOutcome::Conflicts => Applied::Conflicts,
        }),
    }
}

/// Checkout `branch` unless it is already checked out.
pub(crate) fn checkout_if_needed(repo: &Repository, branch: &str) -> Result<()> {
    if repo.current_branch().ok().as_deref() != Some(branch) {
        repo.checkout(branch)?;
    }
    Ok(())
}

/// Refuse to continue while conflicts remain or git still owes a
/// conclusion (merge commit, `rebase --continue`).
pub(crate) fn gate_resolved(repo: &Repository, branch: &str, hint: &str) -> Result<()> {
    if repo.has_conflicts()? {
        return Err(Error::UnresolvedConflicts {
            branch: branch.to_string(),
            hint: hint.to_string(),
        });
    }
    if repo.is_merging() {
        return Err(Error::OperationPending {
            instruction: "git commit --no-edit".to_string(),
        });
    }
    if repo.is_rebasing() {
        return Err(Error::OperationPending {
            instruction: "git rebase --continue".to_string(),
        });
    }
    Ok(())
}

/// Unwind whatever VCS operation the given strategy left in progress.
pub(crate) fn abort_vcs_operation(repo: &Repository, strategy: Strategy) -> Result<()> {
    if strategy == Strategy::Rebase && repo.is_rebasing() {
        repo.abort_rebase()?;
        return Ok(());
    }

    if repo.is_merging() || repo.has_conflicts()? || repo.has_staged_changes()? {
        repo.abort_merge()?;
    }
    Ok(())
}

fn update_hint() -> String {
    "resolve them, then run `git flow update --continue` (or `git flow update --abort` to cancel)"
        .to_string()
}

/// Resolve the branch an update targets, per the type/name combination
/// given on the command line.
fn resolve_target(
    repo: &Repository,
    config: &Config,
    branch_type: Option<&str>,
    name: Option<&str>,
) -> Result<String> {
    let Some(type_name) = branch_type else {
        return match name {
            Some(n) => Ok(n.to_string()),
            None => Ok(repo.current_branch()?),
        };
    };

    let branch = config
        .find(type_name)
        .ok_or_else(|| Error::InvalidBranchType(type_name.to_string()))?;

    if branch.is_base() {
        return Ok(branch.name.clone());
    }

    match name {
        Some(n) => Ok(branch.full_name(n)),
        None => {
            let current = repo.current_branch()?;
            if current.starts_with(&branch.prefix) {
                Ok(current)
            } else {
                Err(Error::InvalidBranchType(format!(
                    "current branch '{current}' is not a {type_name} branch"
                )))
            }
        }
    }
}

/// Update a branch from its parent.
///
/// # Errors
/// Returns [`Error::UnresolvedConflicts`] after persisting the operation
/// state when the strategy stops on conflicts, or another taxonomy error
/// for precondition failures.
pub fn run(
    repo: &Repository,
    config: &Config,
    state: &State,
    branch_type: Option<&str>,
    name: Option<&str>,
) -> Result<UpdateOutcome> {
    config::ensure_initialized(repo)?;
    if state.merge_in_progress() {
        let pending = state.load_merge_state()?;
        return Err(Error::MergeInProgress {
            branch: pending.full_branch_name,
        });
    }

    let full = resolve_target(repo, config, branch_type, name)?;
    let branch = config
        .classify(&full)
        .ok_or_else(|| Error::InvalidBranchType(full.clone()))?;
    if branch.parent.is_empty() {
        return Err(Error::InvalidBranchType(format!(
            "'{full}' has no parent to update from"
        )));
    }

    let parent = branch.parent.clone();
    let strategy = branch.downstream_strategy;
    let type_name = branch.name.clone();
    let user_name = full
        .strip_prefix(&branch.prefix)
        .unwrap_or(&full)
        .to_string();

    if !repo.branch_exists(&full) {
        return Err(Error::BranchNotFound(full));
    }
    if !repo.branch_exists(&parent) {
        return Err(Error::BranchNotFound(parent));
    }
    if !repo.is_clean()? {
        return Err(Error::DirtyWorkingTree);
    }

    checkout_if_needed(repo, &full)?;

    match apply_strategy(repo, &parent, strategy)? {
        Applied::UpToDate => Ok(UpdateOutcome::AlreadyUpToDate {
            branch: full,
            parent,
        }),
        Applied::Done => Ok(UpdateOutcome::Updated {
            branch: full,
            parent,
        }),
        Applied::Conflicts => {
            let descriptor = MergeState {
                action: Action::Update,
                branch_type: type_name,
                branch_name: user_name,
                full_branch_name: full.clone(),
                parent_branch: parent,
                merge_strategy: strategy,
                current_step: Step::Merge,
                child_branches: vec![],
                updated_branches: vec![],
                tag_options: None,
                retention_options: None,
            };
            state.save_merge_state(&descriptor)?;

            Err(Error::UnresolvedConflicts {
                branch: full,
                hint: update_hint(),
            })
        }
    }
}

/// Resume a paused update after the user resolved its conflicts.
///
/// # Errors
/// Returns [`Error::NoMergeInProgress`] without persisted state,
/// [`Error::MergeInProgress`] when the state belongs to a finish, or the
/// gate errors while the repository is still mid-operation.
pub fn continue_op(repo: &Repository, state: &State) -> Result<UpdateOutcome> {
    let descriptor = state.load_merge_state()?;
    if descriptor.action != Action::Update {
        return Err(Error::MergeInProgress {
            branch: descriptor.full_branch_name,
        });
    }

    gate_resolved(repo, &descriptor.full_branch_name, &update_hint())?;

    checkout_if_needed(repo, &descriptor.full_branch_name)?;
    match apply_strategy(repo, &descriptor.parent_branch, descriptor.merge_strategy)? {
        Applied::Conflicts => Err(Error::UnresolvedConflicts {
            branch: descriptor.full_branch_name,
            hint: update_hint(),
        }),
        _ => {
            state.clear_merge_state()?;
            Ok(UpdateOutcome::Updated {
                branch: descriptor.full_branch_name,
                parent: descriptor.parent_branch,
            })
        }
    }
}

/// Abort a paused update, unwinding the in-progress VCS operation and
/// returning to the branch being updated.
///
/// Returns the branch the working tree was left on.
///
/// # Errors
/// Returns [`Error::NoMergeInProgress`] without persisted state or
/// [`Error::MergeInProgress`] when the state belongs to a finish.
pub fn abort_op(repo: &Repository, state: &State) -> Result<String> {
    let descriptor = state.load_merge_state()?;
    if descriptor.action != Action::Update {
        return Err(Error::MergeInProgress {
            branch: descriptor.full_branch_name,
        });
    }

    abort_vcs_operation(repo, descriptor.merge_strategy)?;
    checkout_if_needed(repo, &descriptor.full_branch_name)?;
    state.clear_merge_state()?;

    Ok(descriptor.full_branch_name)
}
