//! Finish: merge a topic branch into its parent, optionally tag, cascade
//! into downstream bases, and clean up.
//!
//! The steps live in a persisted state machine (see [`Step`]); every
//! transition writes the descriptor before the next step runs, so a stop on
//! conflicts can be resumed with `--continue` or unwound with `--abort` in
//! a later invocation. Resume re-executes the current step and relies on
//! the strategies being idempotent once the user concluded them.

use gitflow_git::{RebaseOutcome, Repository};

use crate::branch_name::BranchName;
use crate::config;
use crate::error::{Error, Result};
use crate::state::{Action, MergeState, RetentionOptions, State, Step, TagOptions};
use crate::topology::{Config, Strategy};
use crate::update::{
    Applied, abort_vcs_operation, apply_strategy, checkout_if_needed, gate_resolved,
};

/// Directives carried by a finish invocation.
#[derive(Debug, Clone, Default)]
pub struct FinishOptions {
    /// Tagging flags.
    pub tag: TagOptions,
    /// Branch retention flags.
    pub retention: RetentionOptions,
    /// Skip the clean-working-tree gate.
    pub force: bool,
}

/// What a finish invocation accomplished. A finish interrupted by
/// conflicts reports only the work of the invocation that completed it.
#[derive(Debug)]
pub struct FinishOutcome {
    /// The finished topic branch.
    pub full_branch_name: String,
    /// The base it was merged into.
    pub parent_branch: String,
    /// Tag created by this invocation, if any.
    pub tag: Option<String>,
    /// Cascade targets updated by this invocation.
    pub updated_children: Vec<String>,
    /// Whether the local branch was deleted.
    pub deleted_local: bool,
    /// Whether the remote branch was deleted.
    pub deleted_remote: bool,
}

fn finish_hint(descriptor: &MergeState) -> String {
    format!(
        "resolve them, then run `git flow {} finish --continue {}` (or `--abort` to cancel)",
        descriptor.branch_type, descriptor.branch_name
    )
}

fn conflict_stop(branch: &str, descriptor: &MergeState) -> Error {
    Error::UnresolvedConflicts {
        branch: branch.to_string(),
        hint: finish_hint(descriptor),
    }
}

/// Resolve the topic type, user name and full branch name for a finish.
fn resolve_topic(
    repo: &Repository,
    config: &Config,
    branch_type: Option<&str>,
    name: Option<&str>,
) -> Result<(String, String, String)> {
    let branch = match branch_type {
        Some(type_name) => config
            .find(type_name)
            .filter(|b| b.is_topic())
            .ok_or_else(|| Error::InvalidBranchType(type_name.to_string()))?,
        None => {
            let current = repo.current_branch()?;
            config.resolve_topic(&current).ok_or_else(|| {
                Error::InvalidBranchType(format!(
                    "current branch '{current}' is not a topic branch"
                ))
            })?
        }
    };

    let user_name = match name {
        Some(n) => {
            BranchName::new(n)?;
            n.to_string()
        }
        None => {
            let current = repo.current_branch()?;
            current
                .strip_prefix(&branch.prefix)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::InvalidBranchType(format!(
                        "current branch '{current}' is not a {} branch",
                        branch.name
                    ))
                })?
        }
    };

    let full = branch.full_name(&user_name);
    Ok((branch.name.clone(), user_name, full))
}

/// Finish a topic branch.
///
/// May be invoked from any branch; the machine checks out what it needs.
///
/// # Errors
/// Returns [`Error::MergeInProgress`] when persisted state exists,
/// [`Error::UnresolvedConflicts`] when a step stops on conflicts (state is
/// persisted first), or another taxonomy error for precondition failures.
pub fn run(
    repo: &Repository,
    config: &Config,
    state: &State,
    branch_type: Option<&str>,
    name: Option<&str>,
    options: FinishOptions,
) -> Result<FinishOutcome> {
    config::ensure_initialized(repo)?;
    if state.merge_in_progress() {
        let pending = state.load_merge_state()?;
        return Err(Error::MergeInProgress {
            branch: pending.full_branch_name,
        });
    }

    let (type_name, user_name, full) = resolve_topic(repo, config, branch_type, name)?;

    if !repo.branch_exists(&full) {
        return Err(Error::BranchNotFound(full));
    }
    let parent = config
        .find(&type_name)
        .map(|b| b.parent.clone())
        .unwrap_or_default();
    if !repo.branch_exists(&parent) {
        return Err(Error::BranchNotFound(parent));
    }
    if !options.force && !repo.is_clean()? {
        return Err(Error::DirtyWorkingTree);
    }

    let strategy = match config.find(&type_name).map(|b| b.upstream_strategy) {
        Some(Strategy::None) | None => Strategy::Merge,
        Some(s) => s,
    };

    // The cascade list is captured now so resume order stays deterministic
    // even if base branches are added between invocations.
    let descriptor = MergeState {
        action: Action::Finish,
        branch_type: type_name,
        branch_name: user_name,
        full_branch_name: full,
        parent_branch: parent.clone(),
        merge_strategy: strategy,
        current_step: Step::Merge,
        child_branches: config.cascade_targets(&parent),
        updated_branches: vec![],
        tag_options: Some(options.tag),
        retention_options: Some(options.retention),
    };
    state.save_merge_state(&descriptor)?;

    drive(repo, config, state, descriptor)
}

/// Resume a paused finish after the user resolved its conflicts.
///
/// # Errors
/// Returns [`Error::NoMergeInProgress`] without persisted state,
/// [`Error::MergeInProgress`] when the state belongs to an update, or the
/// gate errors while the repository is still mid-operation.
pub fn continue_op(repo: &Repository, config: &Config, state: &State) -> Result<FinishOutcome> {
    let descriptor = state.load_merge_state()?;
    if descriptor.action != Action::Finish {
        return Err(Error::MergeInProgress {
            branch: descriptor.full_branch_name,
        });
    }

    gate_resolved(repo, &descriptor.full_branch_name, &finish_hint(&descriptor))?;

    drive(repo, config, state, descriptor)
}

/// Abort a paused finish: unwind the in-progress VCS operation, return to
/// the topic branch and drop the state.
///
/// Steps already committed (a merge concluded by hand, a created tag,
/// cascade targets already updated) are left in place.
///
/// Returns the branch the working tree was left on.
///
/// # Errors
/// Returns [`Error::NoMergeInProgress`] without persisted state or
/// [`Error::MergeInProgress`] when the state belongs to an update.
pub fn abort_op(repo: &Repository, state: &State) -> Result<String> {
    let descriptor = state.load_merge_state()?;
    if descriptor.action != Action::Finish {
        return Err(Error::MergeInProgress {
            branch: descriptor.full_branch_name,
        });
    }

    abort_vcs_operation(repo, descriptor.merge_strategy)?;
    checkout_if_needed(repo, &descriptor.full_branch_name)?;
    state.clear_merge_state()?;

    Ok(descriptor.full_branch_name)
}

/// Run the machine from the descriptor's current step to the terminal
/// step. An explicit loop rather than recursion keeps the resume path flat
/// and stack-safe.
fn drive(
    repo: &Repository,
    config: &Config,
    state: &State,
    mut descriptor: MergeState,
) -> Result<FinishOutcome> {
    let mut outcome = FinishOutcome {
        full_branch_name: descriptor.full_branch_name.clone(),
        parent_branch: descriptor.parent_branch.clone(),
        tag: None,
        updated_children: vec![],
        deleted_local: false,
        deleted_remote: false,
    };

    loop {
        match descriptor.current_step {
            Step::Merge => {
                step_merge(repo, &descriptor)?;
                descriptor.current_step = Step::CreateTag;
                state.save_merge_state(&descriptor)?;
            }
            Step::CreateTag => {
                outcome.tag = step_create_tag(repo, config, &descriptor)?;
                descriptor.current_step = Step::UpdateChildren;
                state.save_merge_state(&descriptor)?;
            }
            Step::UpdateChildren => {
                step_update_children(repo, config, state, &mut descriptor, &mut outcome)?;
                descriptor.current_step = Step::DeleteBranch;
                state.save_merge_state(&descriptor)?;
            }
            Step::DeleteBranch => {
                step_delete_branch(repo, config, state, &descriptor, &mut outcome)?;
                return Ok(outcome);
            }
        }
    }
}

/// Move the topic's commits into the parent with the upstream strategy.
fn step_merge(repo: &Repository, descriptor: &MergeState) -> Result<()> {
    match descriptor.merge_strategy {
        Strategy::Rebase => {
            checkout_if_needed(repo, &descriptor.full_branch_name)?;
            if repo.rebase(&descriptor.parent_branch)? == RebaseOutcome::Conflicts {
                return Err(conflict_stop(&descriptor.full_branch_name, descriptor));
            }
            checkout_if_needed(repo, &descriptor.parent_branch)?;
            repo.merge_ff(&descriptor.full_branch_name)?;
            Ok(())
        }
        strategy => {
            checkout_if_needed(repo, &descriptor.parent_branch)?;
            match apply_strategy(repo, &descriptor.full_branch_name, strategy)? {
                Applied::Conflicts => {
                    Err(conflict_stop(&descriptor.parent_branch, descriptor))
                }
                Applied::Done | Applied::UpToDate => Ok(()),
            }
        }
    }
}

/// Tag the parent tip when the type (or an explicit flag) asks for it.
/// An already-existing tag is skipped silently.
fn step_create_tag(
    repo: &Repository,
    config: &Config,
    descriptor: &MergeState,
) -> Result<Option<String>> {
    let branch = config
        .find(&descriptor.branch_type)
        .ok_or_else(|| Error::InvalidBranchType(descriptor.branch_type.clone()))?;
    let options = descriptor.tag_options.clone().unwrap_or_default();

    if !options.tag.unwrap_or(branch.tag) {
        return Ok(None);
    }

    let tag_name = options
        .tag_name
        .unwrap_or_else(|| format!("{}{}", branch.tag_prefix, descriptor.branch_name));
    if repo.tag_exists(&tag_name) {
        return Ok(None);
    }

    let message = options
        .message
        .unwrap_or_else(|| format!("Tagging version {tag_name}"));
    let tag_options = gitflow_git::TagOptions {
        sign: options.sign || options.signing_key.is_some(),
        signing_key: options.signing_key,
        message_file: options.message_file,
    };
    repo.create_annotated_tag(&tag_name, &descriptor.parent_branch, &message, &tag_options)?;

    Ok(Some(tag_name))
}

/// Update the cascade targets captured at entry, in order, committing each
/// to `updatedBranches` only after its strategy reports success.
fn step_update_children(
    repo: &Repository,
    config: &Config,
    state: &State,
    descriptor: &mut MergeState,
    outcome: &mut FinishOutcome,
) -> Result<()> {
    while let Some(child) = descriptor.next_pending_child() {
        let child = child.to_string();
        let strategy = config
            .find(&child)
            .map_or(Strategy::Merge, |b| b.downstream_strategy);

        // The stored strategy tells a later --abort how to unwind this
        // child's operation.
        descriptor.merge_strategy = strategy;
        state.save_merge_state(descriptor)?;

        if !repo.branch_exists(&child) {
            return Err(Error::BranchNotFound(child));
        }

        checkout_if_needed(repo, &child)?;
        match apply_strategy(repo, &descriptor.parent_branch, strategy)? {
            Applied::Conflicts => return Err(conflict_stop(&child, descriptor)),
            Applied::Done | Applied::UpToDate => {
                descriptor.updated_branches.push(child.clone());
                state.save_merge_state(descriptor)?;
                outcome.updated_children.push(child);
            }
        }
    }
    Ok(())
}

/// Remove the finished branch per the retention directives, settle the
/// working tree on the parent and drop the state.
fn step_delete_branch(
    repo: &Repository,
    config: &Config,
    state: &State,
    descriptor: &MergeState,
    outcome: &mut FinishOutcome,
) -> Result<()> {
    let retention = descriptor.retention_options.clone().unwrap_or_default();

    checkout_if_needed(repo, &descriptor.parent_branch)?;

    if !retention.keeps_local() {
        // A squashed topic is never an ancestor of its parent, so a
        // non-forced delete could never succeed.
        let squashed = config
            .find(&descriptor.branch_type)
            .is_some_and(|b| b.upstream_strategy == Strategy::Squash);
        repo.delete_branch(
            &descriptor.full_branch_name,
            retention.forces_delete() || squashed,
        )?;
        outcome.deleted_local = true;
    }

    if !retention.keeps_remote()
        && repo.remote_branch_exists(&config.remote, &descriptor.full_branch_name)
    {
        repo.delete_remote_branch(&config.remote, &descriptor.full_branch_name)?;
        outcome.deleted_remote = true;
    }

    config::clear_branch_base(repo, &descriptor.full_branch_name)?;
    state.clear_merge_state()?;
    Ok(())
}
