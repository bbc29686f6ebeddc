//! Persisted operation state under `<git-dir>/gitflow/`.
//!
//! A multi-step operation (finish, update) writes a [`MergeState`] before
//! every step that can stop on conflicts, so a later invocation can resume
//! with `--continue` or unwind with `--abort`. The file doubles as an
//! advisory lock: at most one operation may be in progress per repository.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::topology::Strategy;

/// Manages the `<git-dir>/gitflow/` state directory.
#[derive(Debug)]
pub struct State {
    gitflow_dir: PathBuf,
}

impl State {
    const STATE_DIR: &'static str = "state";
    const MERGE_STATE_FILE: &'static str = "merge.json";

    /// Create a `State` rooted at the repository's git directory.
    ///
    /// Taking the git directory (not the worktree) keeps this working for
    /// linked worktrees, where `.git` is a file.
    #[must_use]
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            gitflow_dir: git_dir.as_ref().join("gitflow"),
        }
    }

    fn merge_state_path(&self) -> PathBuf {
        self.gitflow_dir
            .join(Self::STATE_DIR)
            .join(Self::MERGE_STATE_FILE)
    }

    /// Check if a multi-step operation is in progress.
    #[must_use]
    pub fn merge_in_progress(&self) -> bool {
        self.merge_state_path().exists()
    }

    /// Load the persisted operation state.
    ///
    /// # Errors
    /// Returns [`Error::NoMergeInProgress`] if no state file exists, or a
    /// parse error for a corrupt one.
    pub fn load_merge_state(&self) -> Result<MergeState> {
        let path = self.merge_state_path();
        if !path.exists() {
            return Err(Error::NoMergeInProgress);
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| Error::StateParse {
            file: path,
            message: e.to_string(),
        })
    }

    /// Persist the operation state, creating directories as needed.
    ///
    /// The write goes through a temp file followed by a rename so a crash
    /// never leaves a half-written descriptor behind.
    ///
    /// # Errors
    /// Returns error if serialization or the write fails.
    pub fn save_merge_state(&self, state: &MergeState) -> Result<()> {
        let path = self.merge_state_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Remove the operation state (on success or abort).
    ///
    /// # Errors
    /// Returns error if file removal fails.
    pub fn clear_merge_state(&self) -> Result<()> {
        let path = self.merge_state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Which engine operation the state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// A finish (merge, tag, cascade, cleanup).
    Finish,
    /// An update (pull parent changes into a branch).
    Update,
}

/// The step a finish is at; updates only ever use [`Step::Merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Move the topic's commits into the parent.
    Merge,
    /// Tag the parent, when the type asks for it.
    CreateTag,
    /// Cascade the parent into its auto-update children.
    UpdateChildren,
    /// Remove the finished topic branch and settle on the parent.
    DeleteBranch,
}

/// Tagging directives carried from the original finish invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagOptions {
    /// Explicit enable/disable (`--tag` / `--notag`); `None` follows the
    /// branch type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<bool>,
    /// Sign the tag.
    #[serde(default)]
    pub sign: bool,
    /// Key to sign with; implies signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key: Option<String>,
    /// Tag message override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Read the tag message from this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_file: Option<String>,
    /// Explicit tag name instead of `tagPrefix + name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
}

/// Branch retention directives carried from the original finish invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionOptions {
    /// Keep the branch entirely (local and remote).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<bool>,
    /// Keep only the local branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_local: Option<bool>,
    /// Keep only the remote branch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_remote: Option<bool>,
    /// Force the local deletion even if unmerged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_delete: Option<bool>,
}

impl RetentionOptions {
    /// Whether the local branch survives the finish.
    #[must_use]
    pub fn keeps_local(&self) -> bool {
        self.keep_local.or(self.keep).unwrap_or(false)
    }

    /// Whether the remote branch survives the finish.
    #[must_use]
    pub fn keeps_remote(&self) -> bool {
        self.keep_remote.or(self.keep).unwrap_or(false)
    }

    /// Whether local deletion may drop unmerged commits.
    #[must_use]
    pub fn forces_delete(&self) -> bool {
        self.force_delete.unwrap_or(false)
    }
}

/// The persisted descriptor of an in-progress multi-step operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeState {
    /// Which operation is in progress.
    pub action: Action,
    /// The branch type name the operation was invoked for.
    pub branch_type: String,
    /// The user part of the branch name (without prefix).
    pub branch_name: String,
    /// The concrete branch name (with prefix).
    pub full_branch_name: String,
    /// The branch being merged into.
    pub parent_branch: String,
    /// Strategy chosen for the current merge step; needed to know how to
    /// abort.
    pub merge_strategy: Strategy,
    /// Where the state machine is.
    pub current_step: Step,
    /// Base branches pending cascade, captured at entry.
    #[serde(default)]
    pub child_branches: Vec<String>,
    /// Cascade targets already processed.
    #[serde(default)]
    pub updated_branches: Vec<String>,
    /// Tagging directives from the original invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_options: Option<TagOptions>,
    /// Retention directives from the original invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_options: Option<RetentionOptions>,
}

impl MergeState {
    /// The next cascade target that has not been processed yet, in the
    /// order captured at entry.
    #[must_use]
    pub fn next_pending_child(&self) -> Option<&str> {
        self.child_branches
            .iter()
            .find(|c| !self.updated_branches.contains(c))
            .map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> MergeState {
        MergeState {
            action: Action::Finish,
            branch_type: "release".to_string(),
            branch_name: "1.0.0".to_string(),
            full_branch_name: "release/1.0.0".to_string(),
            parent_branch: "main".to_string(),
            merge_strategy: Strategy::Merge,
            current_step: Step::UpdateChildren,
            child_branches: vec!["develop".to_string()],
            updated_branches: vec![],
            tag_options: None,
            retention_options: None,
        }
    }

    #[test]
    fn test_no_state_initially() {
        let temp = TempDir::new().unwrap();
        let state = State::new(temp.path());

        assert!(!state.merge_in_progress());
        assert!(matches!(
            state.load_merge_state().unwrap_err(),
            Error::NoMergeInProgress
        ));
    }

    #[test]
    fn test_save_load_clear() {
        let temp = TempDir::new().unwrap();
        let state = State::new(temp.path());

        state.save_merge_state(&sample_state()).unwrap();
        assert!(state.merge_in_progress());

        let loaded = state.load_merge_state().unwrap();
        assert_eq!(loaded, sample_state());

        state.clear_merge_state().unwrap();
        assert!(!state.merge_in_progress());
        // Clearing twice is fine
        state.clear_merge_state().unwrap();
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(sample_state()).unwrap();

        assert_eq!(json["action"], "finish");
        assert_eq!(json["branchType"], "release");
        assert_eq!(json["fullBranchName"], "release/1.0.0");
        assert_eq!(json["parentBranch"], "main");
        assert_eq!(json["mergeStrategy"], "merge");
        assert_eq!(json["currentStep"], "update_children");
        assert_eq!(json["childBranches"][0], "develop");
        assert!(json.get("tagOptions").is_none());
    }

    #[test]
    fn test_loads_minimal_descriptor() {
        let temp = TempDir::new().unwrap();
        let state = State::new(temp.path());
        let dir = temp.path().join("gitflow/state");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("merge.json"),
            r#"{
                "action": "update",
                "branchType": "feature",
                "branchName": "x",
                "fullBranchName": "feature/x",
                "parentBranch": "develop",
                "mergeStrategy": "rebase",
                "currentStep": "merge"
            }"#,
        )
        .unwrap();

        let loaded = state.load_merge_state().unwrap();
        assert_eq!(loaded.action, Action::Update);
        assert_eq!(loaded.merge_strategy, Strategy::Rebase);
        assert!(loaded.child_branches.is_empty());
    }

    #[test]
    fn test_next_pending_child_order() {
        let mut ms = sample_state();
        ms.child_branches = vec!["staging".to_string(), "develop".to_string()];

        assert_eq!(ms.next_pending_child(), Some("staging"));
        ms.updated_branches.push("staging".to_string());
        assert_eq!(ms.next_pending_child(), Some("develop"));
        ms.updated_branches.push("develop".to_string());
        assert_eq!(ms.next_pending_child(), None);
    }

    #[test]
    fn test_corrupt_state_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let state = State::new(temp.path());
        let dir = temp.path().join("gitflow/state");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("merge.json"), "not json").unwrap();

        assert!(matches!(
            state.load_merge_state().unwrap_err(),
            Error::StateParse { .. }
        ));
    }
}
