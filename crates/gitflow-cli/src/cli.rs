//! Command-tree construction.
//!
//! The tree is built at runtime from the loaded configuration: every
//! configured topic type becomes a top-level verb with the same set of
//! subverbs. Static verbs (init, overview, version, update) and the
//! type-detecting shorthands come first.

use clap::{Arg, ArgAction, Command};
use gitflow_core::{BranchType, Config};

/// Verbs that exist regardless of configuration; a topic type with one of
/// these names cannot become a subcommand.
const RESERVED_VERBS: [&str; 8] = [
    "init",
    "overview",
    "version",
    "update",
    "finish",
    "delete",
    "rename",
    "completions",
];

/// Build the full command tree for the given configuration.
pub fn build(config: &Config) -> Command {
    let mut cmd = Command::new("git-flow")
        .about("Branching-workflow automation over git")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(init_command())
        .subcommand(Command::new("overview").about("Show the branch topology and active branches"))
        .subcommand(Command::new("version").about("Print version information"))
        .subcommand(update_command().about("Update a branch from its parent"))
        .subcommand(
            finish_args(Command::new("finish"))
                .about("Finish a topic branch (type detected from the current branch)"),
        )
        .subcommand(
            delete_args(Command::new("delete"))
                .about("Delete a topic branch (type detected from the current branch)"),
        )
        .subcommand(
            rename_args(Command::new("rename"))
                .about("Rename a topic branch (type detected from the current branch)"),
        );

    for topic in config.topics() {
        if RESERVED_VERBS.contains(&topic.name.as_str()) {
            continue;
        }
        cmd = cmd.subcommand(topic_command(topic));
    }

    cmd.subcommand(
        Command::new("completions")
            .about("Generate shell completions")
            .arg(
                Arg::new("shell")
                    .value_name("SHELL")
                    .required(true)
                    .value_parser(clap::value_parser!(clap_complete::Shell)),
            ),
    )
}

fn init_command() -> Command {
    Command::new("init")
        .about("Initialize the workflow in this repository")
        .arg(flag("defaults", "Accept the default topology").short('d'))
        .arg(flag("force", "Reconfigure even when already initialized").short('f'))
        .arg(named_value("main", "NAME", "Name of the production branch"))
        .arg(named_value("develop", "NAME", "Name of the integration branch"))
        .arg(named_value("feature", "PREFIX", "Prefix for feature branches"))
        .arg(named_value("release", "PREFIX", "Prefix for release branches"))
        .arg(named_value("hotfix", "PREFIX", "Prefix for hotfix branches"))
        .arg(named_value("support", "PREFIX", "Prefix for support branches"))
        .arg(named_value("tag", "PREFIX", "Prefix for generated tag names"))
}

fn topic_command(topic: &BranchType) -> Command {
    let name = topic.name.clone();
    Command::new(name.clone())
        .about(format!("Manage {name} branches ({}<name>)", topic.prefix))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("start")
                .about(format!("Start a new {name} branch"))
                .arg(Arg::new("name").value_name("NAME").required(true))
                .arg(paired_flag("fetch", "no-fetch", "Fetch the remote first"))
                .arg(negation_flag("no-fetch", "fetch", "Do not fetch the remote")),
        )
        .subcommand(finish_args(
            Command::new("finish").about(format!("Finish a {name} branch")),
        ))
        .subcommand(Command::new("list").about(format!("List {name} branches")))
        .subcommand(update_command().about(format!("Update a {name} branch from its parent")))
        .subcommand(delete_args(
            Command::new("delete").about(format!("Delete a {name} branch")),
        ))
        .subcommand(rename_args(
            Command::new("rename").about(format!("Rename a {name} branch")),
        ))
        .subcommand(
            Command::new("checkout")
                .about(format!("Checkout a {name} branch by name or prefix"))
                .arg(Arg::new("name").value_name("NAME|PREFIX")),
        )
}

fn update_command() -> Command {
    Command::new("update")
        .arg(Arg::new("name").value_name("NAME"))
        .arg(flag("continue", "Resume after resolving conflicts").conflicts_with("abort"))
        .arg(flag("abort", "Abort and unwind the paused update"))
}

fn finish_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("name").value_name("NAME"))
        .arg(flag("continue", "Resume after resolving conflicts").conflicts_with("abort"))
        .arg(flag("abort", "Abort and unwind the paused finish"))
        .arg(flag("force", "Proceed even with uncommitted changes"))
        .arg(paired_flag("tag", "notag", "Tag the parent branch"))
        .arg(negation_flag("notag", "tag", "Do not tag the parent branch"))
        .arg(paired_flag("sign", "no-sign", "Sign the tag"))
        .arg(negation_flag("no-sign", "sign", "Do not sign the tag"))
        .arg(named_value("signingkey", "KEY", "Key to sign the tag with"))
        .arg(named_value("message", "MESSAGE", "Tag message").short('m'))
        .arg(
            named_value("messagefile", "FILE", "Read the tag message from a file")
                .conflicts_with("message"),
        )
        .arg(named_value("tagname", "NAME", "Explicit tag name"))
        .arg(paired_flag("keep", "no-keep", "Keep the branch after finishing"))
        .arg(negation_flag("no-keep", "keep", "Delete the branch after finishing"))
        .arg(paired_flag("keeplocal", "no-keeplocal", "Keep the local branch"))
        .arg(negation_flag("no-keeplocal", "keeplocal", "Delete the local branch"))
        .arg(paired_flag("keepremote", "no-keepremote", "Keep the remote branch"))
        .arg(negation_flag("no-keepremote", "keepremote", "Delete the remote branch"))
        .arg(paired_flag(
            "force-delete",
            "no-force-delete",
            "Force the local branch deletion",
        ))
        .arg(negation_flag(
            "no-force-delete",
            "force-delete",
            "Never force the local branch deletion",
        ))
}

fn delete_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("name").value_name("NAME").required(true))
        .arg(flag("force", "Delete even if the branch is unmerged").short('f'))
        .arg(flag("remote", "Also delete the branch on the remote").short('r'))
}

fn rename_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("old").value_name("OLD").required(true))
        .arg(Arg::new("new").value_name("NEW").required(true))
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .action(ArgAction::SetTrue)
}

/// A boolean flag that can be overridden by its negation (last one wins).
fn paired_flag(name: &'static str, negation: &'static str, help: &'static str) -> Arg {
    flag(name, help).overrides_with(negation)
}

fn negation_flag(name: &'static str, positive: &'static str, help: &'static str) -> Arg {
    flag(name, help).overrides_with(positive)
}

fn named_value(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).value_name(value_name).help(help)
}
