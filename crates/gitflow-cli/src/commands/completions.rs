//! `git flow completions` - generate shell completion scripts.

use clap::ArgMatches;
use clap_complete::Shell;
use gitflow_core::{Config, Result};

/// Run the completions command.
pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    if let Some(shell) = matches.get_one::<Shell>("shell").copied() {
        let mut cmd = crate::cli::build(config);
        clap_complete::generate(shell, &mut cmd, "git-flow", &mut std::io::stdout());
    }
    Ok(())
}
