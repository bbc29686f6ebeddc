//! `git flow overview` - show the topology and active branches.

use gitflow_core::overview::{self, Overview};
use gitflow_core::Result;

use crate::output;

/// Run the overview command.
pub fn run() -> Result<()> {
    let (repo, config, _state) = super::open()?;
    let overview = overview::collect(&repo, &config)?;
    print(&overview);
    Ok(())
}

fn print(overview: &Overview) {
    output::heading("Base branches:");
    for base in &overview.bases {
        let edge = if base.parent.is_empty() {
            String::new()
        } else {
            format!(
                "  <- {} ({}/{}{})",
                base.parent,
                base.upstream_strategy,
                base.downstream_strategy,
                if base.auto_update { ", auto-update" } else { "" }
            )
        };
        let missing = if base.exists { "" } else { "  [missing]" };
        println!(
            "{}{edge}{missing}",
            output::branch_name(&base.name, base.is_current)
        );
    }

    println!();
    output::heading("Topic branch types:");
    for topic in &overview.topics {
        let tag = if topic.tag {
            format!(", tag '{}<name>'", topic.tag_prefix)
        } else {
            String::new()
        };
        println!(
            "  {}<name>  from {} into {} ({}/{}{tag})",
            topic.prefix,
            topic.start_point,
            topic.parent,
            topic.upstream_strategy,
            topic.downstream_strategy,
        );

        for branch in &topic.branches {
            println!("  {}", output::branch_name(&branch.full_name, branch.is_current));
        }
    }
}
