//! Per-topic-type subverbs (start, finish, list, delete, rename, checkout)
//! and the type-detecting shorthands.

use clap::ArgMatches;
use gitflow_core::branch::{self, CheckoutOutcome, DeleteOptions};
use gitflow_core::finish::{self, FinishOptions, FinishOutcome};
use gitflow_core::start::{self, FetchPolicy};
use gitflow_core::{Config, Error, Result, RetentionOptions, TagOptions};
use gitflow_git::Repository;

use crate::output;

/// Route a topic type's subverb to its handler.
pub fn dispatch_type(type_name: &str, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("start", m)) => start_cmd(type_name, m),
        Some(("finish", m)) => finish(m, Some(type_name)),
        Some(("list", _)) => list(type_name),
        Some(("update", m)) => super::update::run(m, Some(type_name)),
        Some(("delete", m)) => delete(m, Some(type_name)),
        Some(("rename", m)) => rename(m, Some(type_name)),
        Some(("checkout", m)) => checkout(type_name, m),
        _ => Ok(()),
    }
}

/// The topic type the current branch belongs to, for shorthand verbs.
fn detect_type(repo: &Repository, config: &Config) -> Result<String> {
    let current = repo.current_branch()?;
    config.resolve_topic(&current).map_or_else(
        || {
            Err(Error::InvalidBranchType(format!(
                "current branch '{current}' is not a topic branch"
            )))
        },
        |b| Ok(b.name.clone()),
    )
}

fn start_cmd(type_name: &str, matches: &ArgMatches) -> Result<()> {
    let (repo, config, state) = super::open()?;

    let fetch = if matches.get_flag("fetch") {
        FetchPolicy::Yes
    } else if matches.get_flag("no-fetch") {
        FetchPolicy::No
    } else {
        FetchPolicy::Inherit
    };

    let name = require(matches, "name");
    let outcome = start::run(&repo, &config, &state, type_name, &name, fetch)?;

    if outcome.fetched {
        output::info(&format!("Fetched '{}'", config.remote));
    }
    output::success(&format!(
        "Created branch '{}' from '{}'",
        outcome.full_branch_name, outcome.start_point
    ));
    output::info(&format!("Now on branch '{}'", outcome.full_branch_name));

    Ok(())
}

/// Finish handler, shared by `<type> finish` and the shorthand `finish`.
pub fn finish(matches: &ArgMatches, type_name: Option<&str>) -> Result<()> {
    let (repo, config, state) = super::open()?;

    if matches.get_flag("abort") {
        let branch = finish::abort_op(&repo, &state)?;
        output::success(&format!("Finish aborted; back on '{branch}'"));
        return Ok(());
    }

    let outcome = if matches.get_flag("continue") {
        finish::continue_op(&repo, &config, &state)?
    } else {
        let name = matches.get_one::<String>("name").map(String::as_str);
        let options = FinishOptions {
            tag: TagOptions {
                tag: tri(matches, "tag", "notag"),
                sign: matches.get_flag("sign"),
                signing_key: matches.get_one::<String>("signingkey").cloned(),
                message: matches.get_one::<String>("message").cloned(),
                message_file: matches.get_one::<String>("messagefile").cloned(),
                tag_name: matches.get_one::<String>("tagname").cloned(),
            },
            retention: RetentionOptions {
                keep: tri(matches, "keep", "no-keep"),
                keep_local: tri(matches, "keeplocal", "no-keeplocal"),
                keep_remote: tri(matches, "keepremote", "no-keepremote"),
                force_delete: tri(matches, "force-delete", "no-force-delete"),
            },
            force: matches.get_flag("force"),
        };
        finish::run(&repo, &config, &state, type_name, name, options)?
    };

    report_finish(&outcome);
    Ok(())
}

fn report_finish(outcome: &FinishOutcome) {
    output::success(&format!(
        "Finished '{}' into '{}'",
        outcome.full_branch_name, outcome.parent_branch
    ));
    if let Some(tag) = &outcome.tag {
        output::info(&format!("Created tag '{tag}'"));
    }
    for child in &outcome.updated_children {
        output::info(&format!(
            "Updated '{child}' from '{}'",
            outcome.parent_branch
        ));
    }
    if outcome.deleted_local {
        output::info(&format!("Deleted branch '{}'", outcome.full_branch_name));
    }
    if outcome.deleted_remote {
        output::info(&format!(
            "Deleted remote branch '{}'",
            outcome.full_branch_name
        ));
    }
}

fn list(type_name: &str) -> Result<()> {
    let (repo, config, _state) = super::open()?;

    let branches = branch::list(&repo, &config, type_name)?;
    if branches.is_empty() {
        output::info(&format!("No {type_name} branches exist"));
        return Ok(());
    }

    for listed in branches {
        println!("{}", output::branch_name(&listed.name, listed.is_current));
    }
    Ok(())
}

/// Delete handler, shared by `<type> delete` and the shorthand `delete`.
pub fn delete(matches: &ArgMatches, type_name: Option<&str>) -> Result<()> {
    let (repo, config, state) = super::open()?;
    let type_name = match type_name {
        Some(t) => t.to_string(),
        None => detect_type(&repo, &config)?,
    };

    let options = DeleteOptions {
        force: matches.get_flag("force"),
        remote: matches.get_flag("remote"),
    };
    let name = require(matches, "name");
    let outcome = branch::delete(&repo, &config, &state, &type_name, &name, options)?;

    output::success(&format!("Deleted branch '{}'", outcome.full_branch_name));
    if outcome.deleted_remote {
        output::info(&format!(
            "Deleted remote branch '{}'",
            outcome.full_branch_name
        ));
    }
    Ok(())
}

/// Rename handler, shared by `<type> rename` and the shorthand `rename`.
pub fn rename(matches: &ArgMatches, type_name: Option<&str>) -> Result<()> {
    let (repo, config, state) = super::open()?;
    let type_name = match type_name {
        Some(t) => t.to_string(),
        None => detect_type(&repo, &config)?,
    };

    let old = require(matches, "old");
    let new = require(matches, "new");
    let outcome = branch::rename(&repo, &config, &state, &type_name, Some(&old), &new)?;

    output::success(&format!(
        "Renamed '{}' to '{}'",
        outcome.old_full_name, outcome.new_full_name
    ));
    Ok(())
}

fn checkout(type_name: &str, matches: &ArgMatches) -> Result<()> {
    let (repo, config, _state) = super::open()?;

    let name = matches.get_one::<String>("name").map(String::as_str);
    match branch::checkout(&repo, &config, type_name, name)? {
        CheckoutOutcome::CheckedOut(branch) => {
            output::success(&format!("Now on branch '{branch}'"));
        }
        CheckoutOutcome::Available(names) if names.is_empty() => {
            output::info(&format!("No {type_name} branches exist"));
        }
        CheckoutOutcome::Available(names) => {
            output::heading(&format!("Available {type_name} branches:"));
            for name in names {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

/// Read a positional clap marked `required`; absence cannot be observed
/// past parsing.
fn require(matches: &ArgMatches, id: &str) -> String {
    matches
        .get_one::<String>(id)
        .cloned()
        .unwrap_or_default()
}

fn tri(matches: &ArgMatches, yes: &str, no: &str) -> Option<bool> {
    if matches.get_flag(yes) {
        Some(true)
    } else if matches.get_flag(no) {
        Some(false)
    } else {
        None
    }
}
