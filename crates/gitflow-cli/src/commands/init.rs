//! `git flow init` - initialize the workflow in the current repository.

use clap::ArgMatches;
use gitflow_core::init::{self, InitOptions};
use gitflow_core::{Overrides, Result};
use gitflow_git::Repository;

use crate::output;

/// Run the init command.
pub fn run(matches: &ArgMatches) -> Result<()> {
    let repo = Repository::open_current()?;

    let overrides = Overrides {
        main: matches.get_one::<String>("main").cloned(),
        develop: matches.get_one::<String>("develop").cloned(),
        feature_prefix: matches.get_one::<String>("feature").cloned(),
        release_prefix: matches.get_one::<String>("release").cloned(),
        hotfix_prefix: matches.get_one::<String>("hotfix").cloned(),
        support_prefix: matches.get_one::<String>("support").cloned(),
        tag_prefix: matches.get_one::<String>("tag").cloned(),
        remote: None,
    };

    let options = InitOptions {
        force: matches.get_flag("force"),
        overrides,
    };
    let outcome = init::run(&repo, &options)?;

    if outcome.imported_legacy {
        output::info("Imported the existing git-flow configuration");
    }
    for branch in &outcome.created_branches {
        output::info(&format!("Created branch '{branch}'"));
    }
    output::success(&format!(
        "Initialized gitflow; now on branch '{}'",
        outcome.checked_out
    ));

    Ok(())
}
