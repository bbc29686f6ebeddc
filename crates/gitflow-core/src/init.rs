//! Init: write the topology configuration and create the base branches.

use gitflow_git::Repository;

use crate::config;
use crate::error::{Error, Result};
use crate::topology::{Config, Overrides};
use crate::update::checkout_if_needed;

/// Flags and overrides for an init.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Reconfigure even when a configuration already exists.
    pub force: bool,
    /// Renames and prefix adjustments on top of the defaults (or the
    /// imported legacy configuration).
    pub overrides: Overrides,
}

/// Result of an init.
#[derive(Debug)]
pub struct InitOutcome {
    /// Whether the legacy configuration dialect was imported.
    pub imported_legacy: bool,
    /// Base branches created by this init.
    pub created_branches: Vec<String>,
    /// The branch the working tree was left on.
    pub checked_out: String,
    /// The configuration that was persisted.
    pub config: Config,
}

/// Initialize the workflow in the repository.
///
/// Non-interactive: the topology is the default one (or the imported
/// legacy configuration when that dialect is detected), adjusted by the
/// given overrides. Missing base branches are created, on an empty
/// repository via an initial commit on the root. The working tree is left
/// on the root's auto-update child (the integration line) when one
/// exists, else on the root.
///
/// # Errors
/// Returns [`Error::AlreadyInitialized`] without `force`, or a taxonomy
/// error when the resulting topology is invalid or branch creation fails.
pub fn run(repo: &Repository, options: &InitOptions) -> Result<InitOutcome> {
    let initialized = config::is_initialized(repo)?;
    if initialized && !options.force {
        return Err(Error::AlreadyInitialized);
    }

    let imported_legacy = !initialized && config::check_legacy(repo)?;
    let mut cfg = if imported_legacy {
        config::import_legacy(repo)?
    } else {
        Config::default()
    };
    cfg.apply(&options.overrides);
    cfg.validate()?;

    // A forced reconfigure may rename entries; stale keys from the old
    // schema would otherwise resurface as phantom branch types on load.
    if initialized && options.force {
        config::clear(repo)?;
    }

    let order: Vec<(String, String)> = cfg
        .bases_topological()
        .into_iter()
        .map(|b| (b.name.clone(), b.parent.clone()))
        .collect();
    if order.is_empty() {
        return Err(Error::InvalidConfig("no root base branch".to_string()));
    }

    let mut created = Vec::new();
    for (name, parent) in &order {
        if repo.branch_exists(name) {
            continue;
        }
        if parent.is_empty() {
            if repo.has_commits() {
                repo.create_branch(name, None)?;
            } else {
                repo.create_initial_commit(name)?;
            }
        } else {
            repo.create_branch(name, Some(parent))?;
        }
        created.push(name.clone());
    }

    config::save(repo, &cfg)?;

    let root = order[0].0.clone();
    let checked_out = cfg
        .children_of(&root)
        .into_iter()
        .find(|b| b.auto_update)
        .map_or(root, |b| b.name.clone());
    checkout_if_needed(repo, &checked_out)?;

    Ok(InitOutcome {
        imported_legacy,
        created_branches: created,
        checked_out,
        config: cfg,
    })
}
