//! Shared helpers for engine tests: temp repositories driven through the
//! adapter plus plain `git` where a porcelain conclusion is needed.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::process::Command;

use gitflow_git::Repository;
use tempfile::TempDir;

use crate::init::{self, InitOptions};
use crate::state::State;

/// An initialized repository with the default topology (main + develop
/// created, develop checked out).
pub fn setup_initialized() -> (TempDir, Repository, State) {
    let temp = TempDir::new().unwrap();
    let inner = git2::Repository::init(temp.path()).unwrap();
    {
        let mut config = inner.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    drop(inner);

    let repo = Repository::open(temp.path()).unwrap();
    init::run(&repo, &InitOptions::default()).unwrap();
    let state = State::new(repo.git_dir());

    (temp, repo, state)
}

/// Commit a file on the current branch.
pub fn commit_file(dir: &TempDir, path: &str, content: &str, message: &str) {
    fs::write(dir.path().join(path), content).unwrap();

    let inner = git2::Repository::open(dir.path()).unwrap();
    let mut index = inner.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = inner.find_tree(tree_id).unwrap();
    let parent = inner.head().unwrap().peel_to_commit().unwrap();
    let sig = git2::Signature::now("Test", "test@example.com").unwrap();
    inner
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
        .unwrap();
}

/// Resolve a conflicted file and conclude the pending merge or rebase the
/// way a user would, through the git porcelain.
pub fn resolve_and_commit(dir: &TempDir, path: &str, content: &str) {
    fs::write(dir.path().join(path), content).unwrap();

    let run = |args: &[&str]| {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    };

    run(&["add", path]);
    run(&["commit", "--no-edit"]);
}

/// Resolve a conflicted file and continue an in-progress rebase.
pub fn resolve_and_continue_rebase(dir: &TempDir, path: &str, content: &str) {
    fs::write(dir.path().join(path), content).unwrap();

    let run = |args: &[&str], envs: &[(&str, &str)]| {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(dir.path());
        for (k, v) in envs {
            cmd.env(k, v);
        }
        let output = cmd.output().unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    };

    run(&["add", path], &[]);
    run(&["rebase", "--continue"], &[("GIT_EDITOR", "true")]);
}
