//! Configuration store.
//!
//! The topology lives in the repository's key-value config under the
//! `gitflow.*` namespace (`gitflow.branch.<name>.<property>` per entry).
//! Property names are matched case-insensitively on read and written in
//! canonical case.

use std::collections::BTreeMap;

use gitflow_git::Repository;

use crate::error::{Error, Result};
use crate::topology::{BranchKind, BranchType, Config, Overrides, Strategy};

/// Top-level configuration namespace.
pub const NAMESPACE: &str = "gitflow";

fn key(rest: &str) -> String {
    format!("{NAMESPACE}.{rest}")
}

fn branch_key(branch: &str, property: &str) -> String {
    format!("{NAMESPACE}.branch.{branch}.{property}")
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

/// Check whether the repository has a workflow configuration.
///
/// # Errors
/// Returns error if the config store cannot be read.
pub fn is_initialized(repo: &Repository) -> Result<bool> {
    Ok(repo.config_get(&key("version"))?.is_some())
}

/// Fail with [`Error::NotInitialized`] when no configuration exists.
///
/// # Errors
/// Returns error if not initialized or the config store cannot be read.
pub fn ensure_initialized(repo: &Repository) -> Result<()> {
    if is_initialized(repo)? {
        Ok(())
    } else {
        Err(Error::NotInitialized)
    }
}

/// Load the configuration from the repository.
///
/// Returns the default configuration when the repository is not initialized
/// (no `version` key). The loaded topology is validated.
///
/// # Errors
/// Returns error if the config store cannot be read or the stored topology
/// violates an invariant.
pub fn load(repo: &Repository) -> Result<Config> {
    if !is_initialized(repo)? {
        return Ok(Config::default());
    }

    let entries = repo.config_entries(&format!("^{NAMESPACE}\\."))?;

    let mut version = String::new();
    let mut remote = "origin".to_string();
    let mut raw: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

    for (name, value) in entries {
        let Some(rest) = name.strip_prefix(&format!("{NAMESPACE}.")) else {
            continue;
        };

        if rest.eq_ignore_ascii_case("version") {
            version = value;
        } else if rest.eq_ignore_ascii_case("origin") {
            remote = value;
        } else if let Some(branch_rest) = rest.strip_prefix("branch.") {
            // The property is the last component; everything before it is
            // the branch entry name (which may itself contain dots).
            if let Some((branch, property)) = branch_rest.rsplit_once('.') {
                raw.entry(branch.to_string())
                    .or_default()
                    .insert(property.to_ascii_lowercase(), value);
            }
        }
    }

    let mut branches = Vec::new();
    for (name, props) in raw {
        // Entries without a `type` property are per-instance markers
        // (recorded start points), not branch types.
        let Some(kind) = props.get("type") else {
            continue;
        };

        let get = |p: &str| props.get(p).cloned().unwrap_or_default();

        branches.push(BranchType {
            name,
            kind: BranchKind::parse(kind)?,
            parent: get("parent"),
            start_point: get("startpoint"),
            upstream_strategy: Strategy::parse(&get("upstreamstrategy"))?,
            downstream_strategy: Strategy::parse(&get("downstreamstrategy"))?,
            prefix: get("prefix"),
            auto_update: parse_bool(&get("autoupdate")),
            tag: parse_bool(&get("tag")),
            tag_prefix: get("tagprefix"),
        });
    }

    let config = Config {
        version,
        remote,
        branches,
    };
    config.validate()?;
    Ok(config)
}

/// Persist the configuration to the repository.
///
/// # Errors
/// Returns error if the topology is invalid or the config store cannot be
/// written.
pub fn save(repo: &Repository, config: &Config) -> Result<()> {
    config.validate()?;

    repo.config_set(&key("version"), &config.version)?;
    repo.config_set(&key("initialized"), "true")?;
    repo.config_set(&key("origin"), &config.remote)?;

    for branch in &config.branches {
        let set = |property: &str, value: &str| -> Result<()> {
            repo.config_set(&branch_key(&branch.name, property), value)?;
            Ok(())
        };

        set("type", branch.kind.as_str())?;
        if !branch.parent.is_empty() {
            set("parent", &branch.parent)?;
        }
        if !branch.start_point.is_empty() {
            set("startPoint", &branch.start_point)?;
        }
        set("upstreamStrategy", branch.upstream_strategy.as_str())?;
        set("downstreamStrategy", branch.downstream_strategy.as_str())?;
        if !branch.prefix.is_empty() {
            set("prefix", &branch.prefix)?;
        }
        set("autoUpdate", if branch.auto_update { "true" } else { "false" })?;
        if branch.tag {
            set("tag", "true")?;
        }
        if !branch.tag_prefix.is_empty() {
            set("tagprefix", &branch.tag_prefix)?;
        }
    }

    Ok(())
}

/// Remove every key under the namespace.
///
/// # Errors
/// Returns error if the config store cannot be written.
pub fn clear(repo: &Repository) -> Result<()> {
    for (name, _) in repo.config_entries(&format!("^{NAMESPACE}\\."))? {
        repo.config_unset(&name)?;
    }
    Ok(())
}

// === Legacy dialect ===

/// Detect the legacy configuration dialect.
///
/// # Errors
/// Returns error if the config store cannot be read.
pub fn check_legacy(repo: &Repository) -> Result<bool> {
    Ok(repo.config_get(&key("branch.master"))?.is_some()
        || repo.config_get(&key("prefix.feature"))?.is_some())
}

/// Translate the legacy dialect into the current schema and persist it.
///
/// The legacy keys are left in place (read-only from here on); the new
/// schema is authoritative.
///
/// # Errors
/// Returns error if the config store cannot be accessed or the translated
/// topology is invalid.
pub fn import_legacy(repo: &Repository) -> Result<Config> {
    let overrides = Overrides {
        main: repo.config_get(&key("branch.master"))?,
        develop: repo.config_get(&key("branch.develop"))?,
        feature_prefix: repo.config_get(&key("prefix.feature"))?,
        release_prefix: repo.config_get(&key("prefix.release"))?,
        hotfix_prefix: repo.config_get(&key("prefix.hotfix"))?,
        support_prefix: repo.config_get(&key("prefix.support"))?,
        tag_prefix: repo.config_get(&key("prefix.versiontag"))?,
        remote: repo.config_get(&key("origin"))?,
    };

    let mut config = Config::default();
    config.apply(&overrides);
    save(repo, &config)?;
    Ok(config)
}

// === Per-instance and auxiliary keys ===

/// Record the start point a topic branch was created from.
///
/// # Errors
/// Returns error if the config store cannot be written.
pub fn record_branch_base(repo: &Repository, full_name: &str, base: &str) -> Result<()> {
    repo.config_set(&branch_key(full_name, "base"), base)?;
    Ok(())
}

/// Read the recorded start point of a topic branch.
///
/// # Errors
/// Returns error if the config store cannot be read.
pub fn branch_base(repo: &Repository, full_name: &str) -> Result<Option<String>> {
    Ok(repo.config_get(&branch_key(full_name, "base"))?)
}

/// Drop the recorded start point of a topic branch.
///
/// # Errors
/// Returns error if the config store cannot be written.
pub fn clear_branch_base(repo: &Repository, full_name: &str) -> Result<()> {
    repo.config_unset(&branch_key(full_name, "base"))?;
    Ok(())
}

/// Move the recorded start point from one branch name to another.
///
/// # Errors
/// Returns error if the config store cannot be accessed.
pub fn move_branch_base(repo: &Repository, old_full: &str, new_full: &str) -> Result<()> {
    if let Some(base) = branch_base(repo, old_full)? {
        record_branch_base(repo, new_full, &base)?;
        clear_branch_base(repo, old_full)?;
    }
    Ok(())
}

/// Whether deleting branches of this type also deletes the remote branch.
///
/// # Errors
/// Returns error if the config store cannot be read.
pub fn delete_remote_flag(repo: &Repository, type_name: &str) -> Result<bool> {
    Ok(repo
        .config_get_bool(&branch_key(type_name, "deleteRemote"))?
        .unwrap_or(false))
}

/// Whether `start` should fetch when no explicit fetch policy was given.
///
/// # Errors
/// Returns error if the config store cannot be read.
pub fn auto_fetch(repo: &Repository) -> Result<bool> {
    Ok(repo.config_get_bool(&key("fetch"))?.unwrap_or(false))
}
