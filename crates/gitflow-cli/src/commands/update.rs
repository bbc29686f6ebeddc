//! `git flow update` - pull parent changes into a branch.

use clap::ArgMatches;
use gitflow_core::Result;
use gitflow_core::update::{self, UpdateOutcome};

use crate::output;

/// Run the update command, optionally scoped to a topic type.
pub fn run(matches: &ArgMatches, branch_type: Option<&str>) -> Result<()> {
    let (repo, config, state) = super::open()?;

    if matches.get_flag("abort") {
        let branch = update::abort_op(&repo, &state)?;
        output::success(&format!("Update aborted; back on '{branch}'"));
        return Ok(());
    }

    let outcome = if matches.get_flag("continue") {
        update::continue_op(&repo, &state)?
    } else {
        let name = matches.get_one::<String>("name").map(String::as_str);
        update::run(&repo, &config, &state, branch_type, name)?
    };

    match outcome {
        UpdateOutcome::AlreadyUpToDate { branch, parent } => {
            output::success(&format!("'{branch}' is already up to date with '{parent}'"));
        }
        UpdateOutcome::Updated { branch, parent } => {
            output::success(&format!("Updated '{branch}' from '{parent}'"));
        }
    }
    Ok(())
}
