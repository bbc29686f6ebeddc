//! Branch topology model.
//!
//! Base and topic branch types, their parent/start-point edges, per-edge
//! merge strategies, prefixes and tag policy. Branch types are plain records
//! distinguished by [`BranchKind`]; per-type behavior is data, not dispatch.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether a branch type is long-lived (base) or short-lived (topic).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// Long-lived branch, potentially with a parent base.
    Base,
    /// Short-lived branch created with a prefix, finished into a base.
    Topic,
}

impl BranchKind {
    /// Parse from the configuration value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for unknown values.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "topic" => Ok(Self::Topic),
            other => Err(Error::InvalidConfig(format!("unknown branch kind '{other}'"))),
        }
    }

    /// The canonical configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Topic => "topic",
        }
    }
}

/// How commits move along a parent/child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// No movement. Only legal as a downstream strategy.
    None,
    /// Merge commit.
    #[default]
    Merge,
    /// Rebase, then fast-forward.
    Rebase,
    /// Squash into a single commit.
    Squash,
}

impl Strategy {
    /// Parse from the configuration value; empty means merge.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for unknown values.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "" | "merge" => Ok(Self::Merge),
            "none" => Ok(Self::None),
            "rebase" => Ok(Self::Rebase),
            "squash" => Ok(Self::Squash),
            other => Err(Error::InvalidConfig(format!("unknown strategy '{other}'"))),
        }
    }

    /// The canonical configuration value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Merge => "merge",
            Self::Rebase => "rebase",
            Self::Squash => "squash",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named entry in the branch topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchType {
    /// Unique name. For base types this is also the concrete branch name.
    pub name: String,
    /// Base or topic.
    pub kind: BranchKind,
    /// Parent branch type; empty only for the root base.
    pub parent: String,
    /// Where new branches of this type start; empty falls back to `parent`.
    pub start_point: String,
    /// How this branch's commits move into `parent` at finish time.
    pub upstream_strategy: Strategy,
    /// How `parent` changes move into this branch at update/cascade time.
    pub downstream_strategy: Strategy,
    /// Topic prefix; a concrete branch name is `prefix + user name`.
    pub prefix: String,
    /// Whether this base is updated automatically when its parent changes.
    pub auto_update: bool,
    /// Whether finishing a topic of this type tags the parent.
    pub tag: bool,
    /// Prefix for the generated tag name; may be empty.
    pub tag_prefix: String,
}

impl BranchType {
    /// A base branch entry with merge strategies and no prefix.
    #[must_use]
    pub fn base(name: &str, parent: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: BranchKind::Base,
            parent: parent.to_string(),
            start_point: String::new(),
            upstream_strategy: Strategy::Merge,
            downstream_strategy: Strategy::Merge,
            prefix: String::new(),
            auto_update: false,
            tag: false,
            tag_prefix: String::new(),
        }
    }

    /// A topic branch entry with merge strategies and no tag.
    #[must_use]
    pub fn topic(name: &str, parent: &str, prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: BranchKind::Topic,
            parent: parent.to_string(),
            start_point: String::new(),
            upstream_strategy: Strategy::Merge,
            downstream_strategy: Strategy::Merge,
            prefix: prefix.to_string(),
            auto_update: false,
            tag: false,
            tag_prefix: String::new(),
        }
    }

    /// Whether this entry is a base branch.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.kind == BranchKind::Base
    }

    /// Whether this entry is a topic branch type.
    #[must_use]
    pub fn is_topic(&self) -> bool {
        self.kind == BranchKind::Topic
    }

    /// The effective start point: `start_point`, falling back to `parent`.
    #[must_use]
    pub fn effective_start_point(&self) -> &str {
        if self.start_point.is_empty() {
            &self.parent
        } else {
            &self.start_point
        }
    }

    /// The concrete branch name for a user-chosen topic name.
    #[must_use]
    pub fn full_name(&self, user_name: &str) -> String {
        format!("{}{user_name}", self.prefix)
    }
}

/// The whole topology plus schema version and remote name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Schema version string.
    pub version: String,
    /// Remote used for fetch and remote branch deletion.
    pub remote: String,
    /// Branch type entries, in a stable order.
    pub branches: Vec<BranchType>,
}

impl Default for Config {
    /// The classic two-line topology: `main` (production) with child
    /// `develop` (integration), and feature/release/hotfix/support topics.
    fn default() -> Self {
        let mut develop = BranchType::base("develop", "main");
        develop.auto_update = true;

        let feature = BranchType::topic("feature", "develop", "feature/");

        let mut release = BranchType::topic("release", "main", "release/");
        release.start_point = "develop".to_string();
        release.tag = true;

        let mut hotfix = BranchType::topic("hotfix", "main", "hotfix/");
        hotfix.tag = true;

        let support = BranchType::topic("support", "main", "support/");

        Self {
            version: "1.0".to_string(),
            remote: "origin".to_string(),
            branches: vec![
                BranchType::base("main", ""),
                develop,
                feature,
                release,
                hotfix,
                support,
            ],
        }
    }
}

impl Config {
    /// Find a branch type by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&BranchType> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Find a branch type by name (mutable).
    pub fn find_mut(&mut self, name: &str) -> Option<&mut BranchType> {
        self.branches.iter_mut().find(|b| b.name == name)
    }

    /// The root base branch (empty parent), if the topology has exactly one.
    #[must_use]
    pub fn root(&self) -> Option<&BranchType> {
        let mut roots = self.branches.iter().filter(|b| b.is_base() && b.parent.is_empty());
        match (roots.next(), roots.next()) {
            (Some(root), None) => Some(root),
            _ => None,
        }
    }

    /// Iterate base entries.
    pub fn bases(&self) -> impl Iterator<Item = &BranchType> {
        self.branches.iter().filter(|b| b.is_base())
    }

    /// Iterate topic entries.
    pub fn topics(&self) -> impl Iterator<Item = &BranchType> {
        self.branches.iter().filter(|b| b.is_topic())
    }

    /// Exact match among base entries.
    #[must_use]
    pub fn resolve_base(&self, branch: &str) -> Option<&BranchType> {
        self.bases().find(|b| b.name == branch)
    }

    /// Find the topic type whose prefix is the longest match of the given
    /// fully-qualified branch name.
    #[must_use]
    pub fn resolve_topic(&self, full_name: &str) -> Option<&BranchType> {
        self.topics()
            .filter(|b| full_name.starts_with(&b.prefix))
            .max_by_key(|b| b.prefix.len())
    }

    /// Classify a concrete branch name: base first, then topic by prefix.
    #[must_use]
    pub fn classify(&self, branch: &str) -> Option<&BranchType> {
        self.resolve_base(branch)
            .or_else(|| self.resolve_topic(branch))
    }

    /// Base entries whose parent is the given base, in stored order.
    #[must_use]
    pub fn children_of(&self, base_name: &str) -> Vec<&BranchType> {
        self.bases().filter(|b| b.parent == base_name).collect()
    }

    /// Names of the bases to cascade into after a finish lands on
    /// `base_name`: its child bases with the auto-update flag set.
    #[must_use]
    pub fn cascade_targets(&self, base_name: &str) -> Vec<String> {
        self.children_of(base_name)
            .into_iter()
            .filter(|b| b.auto_update)
            .map(|b| b.name.clone())
            .collect()
    }

    /// Base entries in topological order, root first.
    #[must_use]
    pub fn bases_topological(&self) -> Vec<&BranchType> {
        let mut ordered = Vec::new();
        let Some(root) = self.root() else {
            return ordered;
        };

        let mut queue = vec![root];
        while let Some(base) = queue.pop() {
            ordered.push(base);
            for child in self.children_of(&base.name) {
                queue.push(child);
            }
        }
        ordered
    }

    /// Check every topology invariant.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the first violation.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for branch in &self.branches {
            if !names.insert(branch.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate branch type '{}'",
                    branch.name
                )));
            }
        }

        // Exactly one root base
        let roots: Vec<_> = self
            .branches
            .iter()
            .filter(|b| b.is_base() && b.parent.is_empty())
            .collect();
        match roots.len() {
            1 => {}
            0 => return Err(Error::InvalidConfig("no root base branch".to_string())),
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "multiple root base branches: {}",
                    roots
                        .iter()
                        .map(|b| b.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
        }

        for branch in &self.branches {
            if branch.is_topic() && branch.parent.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "topic '{}' has no parent",
                    branch.name
                )));
            }

            if !branch.parent.is_empty() && self.find(&branch.parent).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "'{}' references unknown parent '{}'",
                    branch.name, branch.parent
                )));
            }

            if !branch.start_point.is_empty() && self.find(&branch.start_point).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "'{}' references unknown start point '{}'",
                    branch.name, branch.start_point
                )));
            }

            if branch.is_topic() {
                if branch.prefix.is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "topic '{}' has an empty prefix",
                        branch.name
                    )));
                }

                if branch.upstream_strategy == Strategy::None {
                    return Err(Error::InvalidConfig(format!(
                        "topic '{}' has upstream strategy 'none'",
                        branch.name
                    )));
                }
            }
        }

        // No topic prefix may be a prefix of another (covers duplicates)
        let topics: Vec<_> = self.topics().collect();
        for a in &topics {
            for b in &topics {
                if a.name != b.name && b.prefix.starts_with(&a.prefix) {
                    return Err(Error::InvalidConfig(format!(
                        "prefix '{}' of '{}' shadows prefix '{}' of '{}'",
                        a.prefix, a.name, b.prefix, b.name
                    )));
                }
            }
        }

        // Parent relation must be acyclic
        for branch in &self.branches {
            let mut seen = HashSet::new();
            let mut current = branch;
            while !current.parent.is_empty() {
                if !seen.insert(current.name.as_str()) {
                    return Err(Error::InvalidConfig(format!(
                        "parent cycle involving '{}'",
                        branch.name
                    )));
                }
                match self.find(&current.parent) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        Ok(())
    }

    /// Apply overrides: rename the canonical base lines and adjust prefixes
    /// and the tag prefix. Idempotent.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(main) = overrides.main.as_deref() {
            self.rename_type("main", main);
        }
        if let Some(develop) = overrides.develop.as_deref() {
            self.rename_type("develop", develop);
        }

        let prefixes = [
            ("feature", overrides.feature_prefix.as_deref()),
            ("release", overrides.release_prefix.as_deref()),
            ("hotfix", overrides.hotfix_prefix.as_deref()),
            ("support", overrides.support_prefix.as_deref()),
        ];
        for (name, prefix) in prefixes {
            if let (Some(prefix), Some(branch)) = (prefix, self.find_mut(name)) {
                branch.prefix = prefix.to_string();
            }
        }

        if let Some(tag_prefix) = overrides.tag_prefix.as_deref() {
            for branch in &mut self.branches {
                if branch.tag {
                    branch.tag_prefix = tag_prefix.to_string();
                }
            }
        }

        if let Some(remote) = overrides.remote.as_deref() {
            self.remote = remote.to_string();
        }
    }

    /// Rename a branch type and fix every `parent`/`start_point` that
    /// referenced the old name.
    fn rename_type(&mut self, old: &str, new: &str) {
        if old == new || self.find(old).is_none() {
            return;
        }

        for branch in &mut self.branches {
            if branch.name == old {
                branch.name = new.to_string();
            }
            if branch.parent == old {
                branch.parent = new.to_string();
            }
            if branch.start_point == old {
                branch.start_point = new.to_string();
            }
        }
    }
}

/// Renames and prefix adjustments applied on top of a topology, from init
/// flags or the legacy configuration dialect.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// New name for the production line (`main`).
    pub main: Option<String>,
    /// New name for the integration line (`develop`).
    pub develop: Option<String>,
    /// Prefix for feature branches.
    pub feature_prefix: Option<String>,
    /// Prefix for release branches.
    pub release_prefix: Option<String>,
    /// Prefix for hotfix branches.
    pub hotfix_prefix: Option<String>,
    /// Prefix for support branches.
    pub support_prefix: Option<String>,
    /// Prefix for generated tag names (may be empty).
    pub tag_prefix: Option<String>,
    /// Remote name.
    pub remote: Option<String>,
}
