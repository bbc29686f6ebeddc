//! gitflow CLI - branching-workflow automation over git.

mod cli;
mod commands;
mod output;

fn main() {
    // Respect NO_COLOR environment variable (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // The command tree depends on the configured topic types, so a
    // best-effort configuration load happens before argument parsing; the
    // commands themselves re-open the repository and report real errors.
    let config = commands::tree_config();
    let matches = cli::build(&config).get_matches();

    if let Err(e) = commands::dispatch(&matches, &config) {
        output::error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}
