//! Command handlers: thin adapters from parsed arguments to the engine.

pub mod completions;
pub mod init;
pub mod overview;
pub mod topic;
pub mod update;

use clap::ArgMatches;
use gitflow_core::{Config, Result, State};
use gitflow_git::Repository;

/// Best-effort configuration for building the command tree. Outside a
/// repository (or with a broken configuration) the defaults are used; the
/// command handlers re-open the repository and surface the real error.
pub fn tree_config() -> Config {
    Repository::open_current()
        .ok()
        .and_then(|repo| gitflow_core::config::load(&repo).ok())
        .unwrap_or_default()
}

/// Open the repository, its configuration, and the state store.
pub(crate) fn open() -> Result<(Repository, Config, State)> {
    let repo = Repository::open_current()?;
    let config = gitflow_core::config::load(&repo)?;
    let state = State::new(repo.git_dir());
    Ok((repo, config, state))
}

/// Route a parsed invocation to its handler.
pub fn dispatch(matches: &ArgMatches, tree_config: &Config) -> Result<()> {
    match matches.subcommand() {
        Some(("init", m)) => init::run(m),
        Some(("overview", _)) => overview::run(),
        Some(("version", _)) => {
            println!("git-flow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(("update", m)) => update::run(m, None),
        Some(("finish", m)) => topic::finish(m, None),
        Some(("delete", m)) => topic::delete(m, None),
        Some(("rename", m)) => topic::rename(m, None),
        Some(("completions", m)) => completions::run(m, tree_config),
        Some((type_name, m)) => topic::dispatch_type(type_name, m),
        None => Ok(()),
    }
}
