//! Integration tests for the git-flow CLI.
//!
//! These tests drive the binary end-to-end against real git repositories
//! created in temp directories.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::process::Command as StdCommand;
use tempfile::TempDir;

/// Helper to create a git repository in a temp directory.
fn setup_git_repo() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");

    git(&temp, &["init"]);
    git(&temp, &["config", "user.email", "test@example.com"]);
    git(&temp, &["config", "user.name", "Test User"]);
    git(&temp, &["config", "core.editor", "true"]);

    // Create initial commit so we have a valid HEAD
    fs::write(temp.path().join("README.md"), "# Test Repo\n").expect("Failed to write README");
    git(&temp, &["add", "."]);
    git(&temp, &["commit", "-m", "Initial commit"]);

    // Rename branch to main (in case default is master)
    git(&temp, &["branch", "-M", "main"]);

    temp
}

/// Run a git command in the repo, asserting success.
fn git(dir: &TempDir, args: &[&str]) {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run a git command and capture stdout.
fn git_stdout(dir: &TempDir, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Whether a local branch exists.
fn branch_exists(dir: &TempDir, name: &str) -> bool {
    StdCommand::new("git")
        .args(["rev-parse", "--verify", &format!("refs/heads/{name}")])
        .current_dir(dir)
        .output()
        .expect("Failed to run git")
        .status
        .success()
}

/// Helper to commit a file on the current branch.
fn commit_file(dir: &TempDir, path: &str, content: &str, msg: &str) {
    fs::write(dir.path().join(path), content).expect("Failed to write file");
    git(dir, &["add", path]);
    git(dir, &["commit", "-m", msg]);
}

/// Helper to get the git-flow command.
fn flow() -> Command {
    Command::new(env!("CARGO_BIN_EXE_git-flow"))
}

/// Set up an initialized repository.
fn setup_initialized() -> TempDir {
    let temp = setup_git_repo();
    flow().arg("init").current_dir(&temp).assert().success();
    temp
}

fn merge_state_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join(".git/gitflow/state/merge.json")
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn test_version_flag() {
    flow()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("git-flow"));
}

#[test]
fn test_version_verb() {
    flow()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("git-flow"));
}

#[test]
fn test_help_lists_configured_types() {
    flow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("overview"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("feature"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("hotfix"))
        .stdout(predicate::str::contains("support"));
}

#[test]
fn test_no_subcommand_shows_help() {
    flow()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_base_branches() {
    let temp = setup_git_repo();

    flow()
        .arg("init")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(branch_exists(&temp, "main"));
    assert!(branch_exists(&temp, "develop"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "develop");
    assert_eq!(git_stdout(&temp, &["config", "gitflow.version"]), "1.0");
    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.branch.develop.parent"]),
        "main"
    );
}

#[test]
fn test_init_on_empty_repository() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    git(&temp, &["init"]);
    git(&temp, &["config", "user.email", "test@example.com"]);
    git(&temp, &["config", "user.name", "Test User"]);

    flow()
        .args(["init", "--defaults"])
        .current_dir(&temp)
        .assert()
        .success();

    assert!(branch_exists(&temp, "main"));
    assert!(branch_exists(&temp, "develop"));
}

#[test]
fn test_init_twice_needs_force() {
    let temp = setup_initialized();

    flow()
        .arg("init")
        .current_dir(&temp)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("already initialized"));

    flow()
        .args(["init", "--force"])
        .current_dir(&temp)
        .assert()
        .success();
}

#[test]
fn test_init_imports_legacy_configuration() {
    let temp = setup_git_repo();

    git(&temp, &["config", "gitflow.branch.master", "main"]);
    git(&temp, &["config", "gitflow.branch.develop", "develop"]);
    git(&temp, &["config", "gitflow.prefix.feature", "feat/"]);
    git(&temp, &["config", "gitflow.prefix.versiontag", "v"]);

    flow()
        .arg("init")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported"));

    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.branch.feature.prefix"]),
        "feat/"
    );
    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.branch.release.tagprefix"]),
        "v"
    );
    // Legacy keys stay behind
    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.prefix.feature"]),
        "feat/"
    );
}

#[test]
fn test_not_initialized_exit_code() {
    let temp = setup_git_repo();

    flow()
        .args(["feature", "list"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not initialized"));
}

// ============================================================================
// Start / list / checkout
// ============================================================================

#[test]
fn test_feature_start_and_list() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "auth"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("feature/auth"));

    assert_eq!(
        git_stdout(&temp, &["branch", "--show-current"]),
        "feature/auth"
    );
    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.branch.feature/auth.base"]),
        "develop"
    );

    flow()
        .args(["feature", "list"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"));
}

#[test]
fn test_start_duplicate_branch_exit_code() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "auth"])
        .current_dir(&temp)
        .assert()
        .success();
    flow()
        .args(["feature", "start", "auth"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_start_invalid_name_exit_code() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "bad..name"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid branch name"));
}

#[test]
fn test_checkout_by_prefix() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "alpha"])
        .current_dir(&temp)
        .assert()
        .success();
    flow()
        .args(["feature", "start", "alpine"])
        .current_dir(&temp)
        .assert()
        .success();
    git(&temp, &["checkout", "develop"]);

    for ambiguous in ["al", "alp"] {
        flow()
            .args(["feature", "checkout", ambiguous])
            .current_dir(&temp)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("ambiguous"))
            .stderr(predicate::str::contains("feature/alpha"))
            .stderr(predicate::str::contains("feature/alpine"));
    }

    flow()
        .args(["feature", "checkout", "alph"])
        .current_dir(&temp)
        .assert()
        .success();
    assert_eq!(
        git_stdout(&temp, &["branch", "--show-current"]),
        "feature/alpha"
    );

    flow()
        .args(["feature", "checkout", "zzz"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(5);
}

// ============================================================================
// Finish
// ============================================================================

#[test]
fn test_happy_feature_finish() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "feat.txt", "work", "feature work");

    flow()
        .args(["feature", "finish", "x"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished 'feature/x' into 'develop'"));

    assert!(!branch_exists(&temp, "feature/x"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "develop");
    assert!(temp.path().join("feat.txt").exists());
    assert!(!merge_state_path(&temp).exists());
    assert_eq!(git_stdout(&temp, &["tag", "-l"]), "");
}

#[test]
fn test_shorthand_finish_detects_type() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "y"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "feat.txt", "work", "feature work");

    flow()
        .arg("finish")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("feature/y"));
}

#[test]
fn test_rebase_finish_conflict_and_continue() {
    let temp = setup_initialized();
    git(
        &temp,
        &["config", "gitflow.branch.feature.upstreamStrategy", "rebase"],
    );

    commit_file(&temp, "a.txt", "base\n", "seed");
    flow()
        .args(["feature", "start", "y"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "a.txt", "feature side\n", "feature change");
    git(&temp, &["checkout", "develop"]);
    commit_file(&temp, "a.txt", "develop side\n", "develop change");

    flow()
        .args(["feature", "finish", "y"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("--continue"));

    let state = fs::read_to_string(merge_state_path(&temp)).unwrap();
    assert!(state.contains("\"currentStep\": \"merge\""));
    assert!(state.contains("\"mergeStrategy\": \"rebase\""));

    // Resolve the rebase conflict and conclude the rebase by hand
    fs::write(temp.path().join("a.txt"), "resolved\n").unwrap();
    git(&temp, &["add", "a.txt"]);
    git(&temp, &["-c", "core.editor=true", "rebase", "--continue"]);

    flow()
        .args(["feature", "finish", "--continue"])
        .current_dir(&temp)
        .assert()
        .success();

    assert!(!branch_exists(&temp, "feature/y"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "develop");
    assert!(!merge_state_path(&temp).exists());
}

#[test]
fn test_release_finish_tags_and_cascades() {
    let temp = setup_initialized();
    git(&temp, &["config", "gitflow.branch.release.tagprefix", "v"]);

    flow()
        .args(["release", "start", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "rel.txt", "release", "release work");

    flow()
        .args(["release", "finish", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished 'release/1.0.0' into 'main'"))
        .stdout(predicate::str::contains("Created tag 'v1.0.0'"))
        .stdout(predicate::str::contains("Updated 'develop' from 'main'"));

    assert_eq!(git_stdout(&temp, &["tag", "-l", "v1.0.0"]), "v1.0.0");
    let tag = git_stdout(&temp, &["cat-file", "-p", "refs/tags/v1.0.0"]);
    assert!(tag.contains("Tagging version v1.0.0"));

    // The cascade merged main into develop
    git(&temp, &["merge-base", "--is-ancestor", "main", "develop"]);
    assert!(!branch_exists(&temp, "release/1.0.0"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "main");
}

#[test]
fn test_cascade_conflict_then_continue() {
    let temp = setup_initialized();
    git(&temp, &["config", "gitflow.branch.release.tagprefix", "v"]);

    flow()
        .args(["release", "start", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "a.txt", "release side\n", "release change");
    git(&temp, &["checkout", "develop"]);
    commit_file(&temp, "a.txt", "develop side\n", "develop change");

    flow()
        .args(["release", "finish", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6);

    let state = fs::read_to_string(merge_state_path(&temp)).unwrap();
    assert!(state.contains("\"currentStep\": \"update_children\""));
    assert!(state.contains("\"childBranches\": [\n    \"develop\"\n  ]"));
    assert!(state.contains("\"updatedBranches\": []"));

    // Calling finish again without flags reports the blocked operation
    flow()
        .args(["release", "finish", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("already in progress"));

    // Resolve the cascade conflict and conclude the merge
    fs::write(temp.path().join("a.txt"), "resolved\n").unwrap();
    git(&temp, &["add", "a.txt"]);
    git(&temp, &["commit", "--no-edit"]);

    flow()
        .args(["release", "finish", "--continue"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 'develop' from 'main'"));

    assert!(!merge_state_path(&temp).exists());
    assert!(!branch_exists(&temp, "release/1.0.0"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "main");
}

#[test]
fn test_abort_during_cascade_keeps_tag() {
    let temp = setup_initialized();
    git(&temp, &["config", "gitflow.branch.release.tagprefix", "v"]);

    flow()
        .args(["release", "start", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "a.txt", "release side\n", "release change");
    git(&temp, &["checkout", "develop"]);
    commit_file(&temp, "a.txt", "develop side\n", "develop change");
    let develop_tip = git_stdout(&temp, &["rev-parse", "develop"]);

    flow()
        .args(["release", "finish", "1.0.0"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6);

    flow()
        .args(["release", "finish", "--abort"])
        .current_dir(&temp)
        .assert()
        .success();

    assert!(!merge_state_path(&temp).exists());
    // The already-committed tag step survives; the conflicted child merge
    // was unwound; the topic branch is back under our feet.
    assert_eq!(git_stdout(&temp, &["tag", "-l", "v1.0.0"]), "v1.0.0");
    assert_eq!(git_stdout(&temp, &["rev-parse", "develop"]), develop_tip);
    assert!(branch_exists(&temp, "release/1.0.0"));
    assert_eq!(
        git_stdout(&temp, &["branch", "--show-current"]),
        "release/1.0.0"
    );
}

#[test]
fn test_continue_without_state() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "finish", "--continue"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no merge in progress"));

    flow()
        .args(["feature", "finish", "--abort"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_finish_missing_branch_exit_code() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "finish", "ghost"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("branch not found"));
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_pulls_parent_changes() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();
    git(&temp, &["checkout", "develop"]);
    commit_file(&temp, "d.txt", "develop", "develop change");
    git(&temp, &["checkout", "feature/x"]);

    flow()
        .arg("update")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 'feature/x' from 'develop'"));
    assert!(temp.path().join("d.txt").exists());

    // A second update is a no-op
    flow()
        .arg("update")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn test_update_conflict_continue_and_abort() {
    let temp = setup_initialized();

    commit_file(&temp, "a.txt", "base\n", "seed");
    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "a.txt", "feature side\n", "feature change");
    git(&temp, &["checkout", "develop"]);
    commit_file(&temp, "a.txt", "develop side\n", "develop change");
    git(&temp, &["checkout", "feature/x"]);

    flow()
        .args(["feature", "update"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("update --continue"));
    assert!(merge_state_path(&temp).exists());

    flow()
        .args(["update", "--abort"])
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!merge_state_path(&temp).exists());
    assert_eq!(
        git_stdout(&temp, &["branch", "--show-current"]),
        "feature/x"
    );

    // Same conflict again, resolved this time
    flow()
        .args(["feature", "update"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(6);
    fs::write(temp.path().join("a.txt"), "resolved\n").unwrap();
    git(&temp, &["add", "a.txt"]);
    git(&temp, &["commit", "--no-edit"]);

    flow()
        .args(["update", "--continue"])
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!merge_state_path(&temp).exists());
}

// ============================================================================
// Delete / rename / overview
// ============================================================================

#[test]
fn test_delete_and_rename() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "old"])
        .current_dir(&temp)
        .assert()
        .success();

    flow()
        .args(["feature", "rename", "old", "new"])
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Renamed 'feature/old' to 'feature/new'"));
    assert!(!branch_exists(&temp, "feature/old"));
    assert!(branch_exists(&temp, "feature/new"));
    assert_eq!(
        git_stdout(&temp, &["config", "gitflow.branch.feature/new.base"]),
        "develop"
    );

    // Deleting the current branch moves to the parent first
    flow()
        .args(["feature", "delete", "new"])
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!branch_exists(&temp, "feature/new"));
    assert_eq!(git_stdout(&temp, &["branch", "--show-current"]), "develop");

    flow()
        .args(["feature", "delete", "new"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(5);
}

#[test]
fn test_delete_unmerged_requires_force() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "feat.txt", "work", "feature work");
    git(&temp, &["checkout", "develop"]);

    flow()
        .args(["feature", "delete", "x"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(3);

    flow()
        .args(["feature", "delete", "x", "--force"])
        .current_dir(&temp)
        .assert()
        .success();
    assert!(!branch_exists(&temp, "feature/x"));
}

#[test]
fn test_overview_shows_topology() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();

    flow()
        .arg("overview")
        .current_dir(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("develop"))
        .stdout(predicate::str::contains("main"))
        .stdout(predicate::str::contains("feature/"))
        .stdout(predicate::str::contains("feature/x"));
}

#[test]
fn test_dirty_working_tree_blocks_finish() {
    let temp = setup_initialized();

    flow()
        .args(["feature", "start", "x"])
        .current_dir(&temp)
        .assert()
        .success();
    commit_file(&temp, "feat.txt", "work", "feature work");
    fs::write(temp.path().join("feat.txt"), "uncommitted").unwrap();

    flow()
        .args(["feature", "finish", "x"])
        .current_dir(&temp)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("uncommitted changes"));
}
