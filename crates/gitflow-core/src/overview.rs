//! Overview: assemble the topology and active branches for display.

use gitflow_git::Repository;

use crate::branch::ListedBranch;
use crate::config;
use crate::error::Result;
use crate::topology::{Config, Strategy};

/// A base branch edge.
#[derive(Debug)]
pub struct BaseOverview {
    /// Branch name.
    pub name: String,
    /// Parent base, empty for the root.
    pub parent: String,
    /// Upstream strategy.
    pub upstream_strategy: Strategy,
    /// Downstream strategy.
    pub downstream_strategy: Strategy,
    /// Whether the base follows its parent automatically.
    pub auto_update: bool,
    /// Whether the branch exists in the repository.
    pub exists: bool,
    /// Whether this is the current branch.
    pub is_current: bool,
}

/// A topic type with its active branches.
#[derive(Debug)]
pub struct TopicOverview {
    /// Type name.
    pub name: String,
    /// Branch prefix.
    pub prefix: String,
    /// Parent base.
    pub parent: String,
    /// Effective start point.
    pub start_point: String,
    /// Upstream strategy.
    pub upstream_strategy: Strategy,
    /// Downstream strategy.
    pub downstream_strategy: Strategy,
    /// Whether finishing tags the parent.
    pub tag: bool,
    /// Tag name prefix.
    pub tag_prefix: String,
    /// Active branches of this type.
    pub branches: Vec<ListedBranch>,
}

/// Everything the overview verb prints.
#[derive(Debug)]
pub struct Overview {
    /// Base branch edges.
    pub bases: Vec<BaseOverview>,
    /// Topic type configurations with their active branches.
    pub topics: Vec<TopicOverview>,
}

/// Collect the overview data.
///
/// # Errors
/// Returns error when not initialized or the repository cannot be read.
pub fn collect(repo: &Repository, config: &Config) -> Result<Overview> {
    config::ensure_initialized(repo)?;

    let current = repo.current_branch().ok();
    let all_branches = repo.list_branches()?;

    let bases = config
        .bases()
        .map(|base| BaseOverview {
            name: base.name.clone(),
            parent: base.parent.clone(),
            upstream_strategy: base.upstream_strategy,
            downstream_strategy: base.downstream_strategy,
            auto_update: base.auto_update,
            exists: all_branches.iter().any(|b| *b == base.name),
            is_current: current.as_deref() == Some(base.name.as_str()),
        })
        .collect();

    let topics = config
        .topics()
        .map(|topic| {
            let mut branches: Vec<ListedBranch> = all_branches
                .iter()
                .filter(|b| b.starts_with(&topic.prefix))
                .map(|full| ListedBranch {
                    name: full[topic.prefix.len()..].to_string(),
                    full_name: full.clone(),
                    is_current: current.as_deref() == Some(full.as_str()),
                })
                .collect();
            branches.sort_by(|a, b| a.name.cmp(&b.name));

            TopicOverview {
                name: topic.name.clone(),
                prefix: topic.prefix.clone(),
                parent: topic.parent.clone(),
                start_point: topic.effective_start_point().to_string(),
                upstream_strategy: topic.upstream_strategy,
                downstream_strategy: topic.downstream_strategy,
                tag: topic.tag,
                tag_prefix: topic.tag_prefix.clone(),
                branches,
            }
        })
        .collect();

    Ok(Overview { bases, topics })
}
