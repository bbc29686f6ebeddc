//! Repository wrapper providing high-level git operations.

use std::path::Path;
use std::process::Output;

use git2::{BranchType, Oid, RepositoryState};

use crate::error::{Error, Result};

/// Outcome of a merge-like operation (merge, fast-forward, squash).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The merge completed and produced (or fast-forwarded to) a commit.
    Completed,
    /// The merge stopped on conflicts; the working tree holds the markers.
    Conflicts,
    /// The source branch is already contained in the target; nothing to do.
    UpToDate,
}

/// Outcome of a rebase operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// The rebase completed (possibly a no-op).
    Completed,
    /// The rebase stopped on conflicts.
    Conflicts,
}

/// Options for annotated tag creation.
#[derive(Debug, Default, Clone)]
pub struct TagOptions {
    /// Sign the tag (`git tag -s`).
    pub sign: bool,
    /// Key to sign with (`git tag -u <key>`); implies signing.
    pub signing_key: Option<String>,
    /// Read the tag message from this file instead of the message argument.
    pub message_file: Option<String>,
}

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|_| Error::NotARepository)?;
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Check if the repository has at least one commit.
    #[must_use]
    pub fn has_commits(&self) -> bool {
        self.inner
            .head()
            .is_ok_and(|head| head.peel_to_commit().is_ok())
    }

    /// Check if there's a rebase in progress.
    #[must_use]
    pub fn is_rebasing(&self) -> bool {
        matches!(
            self.inner.state(),
            RepositoryState::Rebase
                | RepositoryState::RebaseInteractive
                | RepositoryState::RebaseMerge
        )
    }

    /// Check if there's a merge in progress (MERGE_HEAD present).
    #[must_use]
    pub fn is_merging(&self) -> bool {
        self.inner.state() == RepositoryState::Merge
    }

    /// Check if the index has unresolved conflicts.
    ///
    /// # Errors
    /// Returns error if the index cannot be read.
    pub fn has_conflicts(&self) -> Result<bool> {
        Ok(self.inner.index()?.has_conflicts())
    }

    // === Branch operations ===

    /// Get the name of the current branch.
    ///
    /// # Errors
    /// Returns error if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.inner.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }

        head.shorthand().map(String::from).ok_or(Error::DetachedHead)
    }

    /// Get the commit SHA at the tip of a branch.
    ///
    /// # Errors
    /// Returns error if branch doesn't exist.
    pub fn branch_tip(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch_name.into()))?;

        branch
            .get()
            .target()
            .ok_or_else(|| Error::BranchNotFound(branch_name.into()))
    }

    /// List all local branches.
    ///
    /// # Errors
    /// Returns error if branch listing fails.
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let branches = self.inner.branches(Some(BranchType::Local))?;

        let names: Vec<String> = branches
            .filter_map(std::result::Result::ok)
            .filter_map(|(b, _)| b.name().ok().flatten().map(String::from))
            .collect();

        Ok(names)
    }

    /// Check if a local branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    /// Check if a remote-tracking branch exists locally.
    #[must_use]
    pub fn remote_branch_exists(&self, remote: &str, name: &str) -> bool {
        self.inner
            .find_reference(&format!("refs/remotes/{remote}/{name}"))
            .is_ok()
    }

    /// Create a branch from a start point (branch name or commit-ish).
    ///
    /// An empty start point means the current HEAD.
    ///
    /// # Errors
    /// Returns error if the start point cannot be resolved or the branch
    /// already exists.
    pub fn create_branch(&self, name: &str, start_point: Option<&str>) -> Result<Oid> {
        let commit = match start_point {
            Some(sp) if !sp.is_empty() => self
                .inner
                .revparse_single(sp)
                .map_err(|_| Error::BranchNotFound(sp.into()))?
                .peel_to_commit()?,
            _ => self.inner.head()?.peel_to_commit()?,
        };

        let branch = self.inner.branch(name, &commit, false)?;
        branch
            .get()
            .target()
            .ok_or_else(|| Error::BranchNotFound(name.into()))
    }

    /// Create an initial (parentless) commit on the given branch and point
    /// HEAD at it. Used to seed base branches in an empty repository.
    ///
    /// # Errors
    /// Returns error if the repository already has commits on that branch
    /// or the commit cannot be created.
    pub fn create_initial_commit(&self, branch_name: &str) -> Result<Oid> {
        let sig = self.inner.signature()?;
        let tree_id = self.inner.index()?.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let refname = format!("refs/heads/{branch_name}");
        let oid = self
            .inner
            .commit(Some(&refname), &sig, &sig, "Initial commit", &tree, &[])?;
        self.inner.set_head(&refname)?;

        Ok(oid)
    }

    /// Checkout a branch.
    ///
    /// # Errors
    /// Returns error if the branch doesn't exist or the checkout would
    /// clobber local changes.
    pub fn checkout(&self, branch_name: &str) -> Result<()> {
        let branch = self
            .inner
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch_name.into()))?;

        let object = branch.get().peel(git2::ObjectType::Commit)?;
        self.inner.checkout_tree(&object, None)?;
        self.inner.set_head(&format!("refs/heads/{branch_name}"))?;

        Ok(())
    }

    /// Delete a local branch.
    ///
    /// Without `force` the deletion refuses branches not merged into HEAD,
    /// matching `git branch -d`.
    ///
    /// # Errors
    /// Returns error if the branch doesn't exist or is unmerged.
    pub fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        if !self.branch_exists(name) {
            return Err(Error::BranchNotFound(name.into()));
        }

        let flag = if force { "-D" } else { "-d" };
        let output = self.run_git(&["branch", flag, name])?;
        Self::expect_success("branch delete", &output)
    }

    /// Delete a branch on the given remote.
    ///
    /// # Errors
    /// Returns error if the push fails.
    pub fn delete_remote_branch(&self, remote: &str, name: &str) -> Result<()> {
        let output = self.run_git(&["push", remote, "--delete", name])?;
        Self::expect_success("push --delete", &output)
    }

    /// Rename a local branch. A missing `old_name` renames the current
    /// branch.
    ///
    /// # Errors
    /// Returns error if the source branch doesn't exist or the new name is
    /// taken.
    pub fn rename_branch(&self, new_name: &str, old_name: Option<&str>) -> Result<()> {
        let old = match old_name {
            Some(name) => name.to_string(),
            None => self.current_branch()?,
        };

        let was_current = self.current_branch().ok().as_deref() == Some(old.as_str());

        let mut branch = self
            .inner
            .find_branch(&old, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(old.clone()))?;
        branch.rename(new_name, false)?;

        if was_current {
            self.inner.set_head(&format!("refs/heads/{new_name}"))?;
        }

        Ok(())
    }

    // === Merge / rebase operations ===

    /// Merge `source` into the current branch with a merge commit
    /// (`git merge --no-ff`).
    ///
    /// # Errors
    /// Returns error if the merge fails for a reason other than conflicts.
    pub fn merge(&self, source: &str) -> Result<MergeOutcome> {
        if self.head_contains(source)? {
            return Ok(MergeOutcome::UpToDate);
        }

        let output = self.run_git(&["merge", "--no-ff", "--no-edit", source])?;
        self.merge_result("merge", &output)
    }

    /// Fast-forward the current branch to `source` (`git merge --ff-only`).
    ///
    /// # Errors
    /// Returns error if a fast-forward is not possible.
    pub fn merge_ff(&self, source: &str) -> Result<MergeOutcome> {
        if self.head_contains(source)? {
            return Ok(MergeOutcome::UpToDate);
        }

        let output = self.run_git(&["merge", "--ff-only", source])?;
        self.merge_result("merge --ff-only", &output)
    }

    /// Squash-merge `source` into the current branch and commit the result
    /// with git's generated squash message.
    ///
    /// # Errors
    /// Returns error if the squash or the follow-up commit fails.
    pub fn squash_merge(&self, source: &str) -> Result<MergeOutcome> {
        if self.head_contains(source)? {
            return Ok(MergeOutcome::UpToDate);
        }

        let output = self.run_git(&["merge", "--squash", source])?;
        match self.merge_result("merge --squash", &output)? {
            MergeOutcome::Completed => {}
            other => return Ok(other),
        }

        // --squash stages the result without committing; SQUASH_MSG holds
        // the generated message.
        let output = self.run_git(&["commit", "--no-edit"])?;
        Self::expect_success("commit", &output)?;
        Ok(MergeOutcome::Completed)
    }

    /// Rebase the current branch onto `upstream`.
    ///
    /// # Errors
    /// Returns error if the rebase fails for a reason other than conflicts.
    pub fn rebase(&self, upstream: &str) -> Result<RebaseOutcome> {
        let output = self.run_git(&["rebase", upstream])?;
        if output.status.success() {
            return Ok(RebaseOutcome::Completed);
        }

        if self.is_rebasing() {
            return Ok(RebaseOutcome::Conflicts);
        }

        Err(Error::Command {
            op: "rebase",
            cause: Self::stderr(&output),
        })
    }

    /// Abort an in-progress merge.
    ///
    /// A squash merge leaves no MERGE_HEAD behind, so `git merge --abort`
    /// refuses it; fall back to `git reset --merge`, which unwinds the
    /// conflicted index and working tree either way.
    ///
    /// # Errors
    /// Returns error if the abort fails.
    pub fn abort_merge(&self) -> Result<()> {
        if self.is_merging() {
            let output = self.run_git(&["merge", "--abort"])?;
            return Self::expect_success("merge --abort", &output);
        }

        let output = self.run_git(&["reset", "--merge"])?;
        Self::expect_success("reset --merge", &output)
    }

    /// Abort an in-progress rebase.
    ///
    /// # Errors
    /// Returns error if no rebase is in progress or the abort fails.
    pub fn abort_rebase(&self) -> Result<()> {
        let output = self.run_git(&["rebase", "--abort"])?;
        Self::expect_success("rebase --abort", &output)
    }

    fn merge_result(&self, op: &'static str, output: &Output) -> Result<MergeOutcome> {
        if output.status.success() {
            return Ok(MergeOutcome::Completed);
        }

        if self.has_conflicts()? {
            return Ok(MergeOutcome::Conflicts);
        }

        Err(Error::Command {
            op,
            cause: Self::stderr(output),
        })
    }

    /// Check whether the tip of `source` is already reachable from HEAD.
    fn head_contains(&self, source: &str) -> Result<bool> {
        let head = self.inner.head()?.peel_to_commit()?.id();
        let tip = self.branch_tip(source)?;

        if head == tip {
            return Ok(true);
        }
        Ok(self.inner.graph_descendant_of(head, tip)?)
    }

    /// Check if there are staged changes ready to commit.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .include_unmodified(false);
        let statuses = self.inner.statuses(Some(&mut opts))?;

        for entry in statuses.iter() {
            let status = entry.status();
            if status.intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE,
            ) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Commit whatever is staged, reusing git's prepared message
    /// (MERGE_MSG / SQUASH_MSG) when one exists.
    ///
    /// # Errors
    /// Returns error if the commit fails.
    pub fn commit_staged(&self) -> Result<()> {
        let output = self.run_git(&["commit", "--no-edit"])?;
        Self::expect_success("commit", &output)
    }

    // === Tag operations ===

    /// Check if a tag exists.
    #[must_use]
    pub fn tag_exists(&self, name: &str) -> bool {
        self.inner
            .find_reference(&format!("refs/tags/{name}"))
            .is_ok()
    }

    /// Create an annotated tag on `target` (a branch name or commit-ish).
    ///
    /// # Errors
    /// Returns error if the tag cannot be created.
    pub fn create_annotated_tag(
        &self,
        name: &str,
        target: &str,
        message: &str,
        options: &TagOptions,
    ) -> Result<()> {
        let mut args = vec!["tag", "-a", name];

        if let Some(file) = options.message_file.as_deref() {
            args.push("-F");
            args.push(file);
        } else {
            args.push("-m");
            args.push(message);
        }

        if let Some(key) = options.signing_key.as_deref() {
            args.push("-u");
            args.push(key);
        } else if options.sign {
            args.push("-s");
        }

        args.push(target);

        let output = self.run_git(&args)?;
        Self::expect_success("tag", &output)
    }

    // === Remote operations ===

    /// Fetch from the given remote.
    ///
    /// # Errors
    /// Returns error if the fetch fails.
    pub fn fetch(&self, remote: &str) -> Result<()> {
        let output = self.run_git(&["fetch", remote])?;
        Self::expect_success("fetch", &output)
    }

    // === Working tree state ===

    /// Check if the working directory is clean (no modified or staged
    /// files). Untracked files are ignored.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn is_clean(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .include_unmodified(false)
            .exclude_submodules(true);
        let statuses = self.inner.statuses(Some(&mut opts))?;

        for entry in statuses.iter() {
            let status = entry.status();
            if status.intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_TYPECHANGE
                    | git2::Status::WT_RENAMED,
            ) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // === Configuration access ===

    /// Read a string value from the repository configuration.
    ///
    /// # Errors
    /// Returns error if the config store cannot be read.
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        let snapshot = self.inner.config()?.snapshot()?;
        match snapshot.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Git2(e)),
        }
    }

    /// Read a boolean value from the repository configuration.
    ///
    /// # Errors
    /// Returns error if the config store cannot be read.
    pub fn config_get_bool(&self, key: &str) -> Result<Option<bool>> {
        let snapshot = self.inner.config()?.snapshot()?;
        match snapshot.get_bool(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Git2(e)),
        }
    }

    /// Write a string value to the repository configuration.
    ///
    /// # Errors
    /// Returns error if the config store cannot be written.
    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.inner.config()?;
        config.set_str(key, value)?;
        Ok(())
    }

    /// Remove a key from the repository configuration. Removing an absent
    /// key is not an error.
    ///
    /// # Errors
    /// Returns error if the config store cannot be written.
    pub fn config_unset(&self, key: &str) -> Result<()> {
        let mut config = self.inner.config()?;
        match config.remove(key) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(Error::Git2(e)),
        }
    }

    /// List all configuration entries whose names match the given regular
    /// expression, as (name, value) pairs.
    ///
    /// # Errors
    /// Returns error if the config store cannot be read.
    pub fn config_entries(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        let config = self.inner.config()?;
        let mut entries = config.entries(Some(pattern))?;

        let mut pairs = Vec::new();
        while let Some(entry) = entries.next() {
            let entry = entry?;
            if let (Some(name), Some(value)) = (entry.name(), entry.value()) {
                pairs.push((name.to_string(), value.to_string()));
            }
        }
        Ok(pairs)
    }

    // === Helpers ===

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        let workdir = self.workdir().ok_or(Error::NotARepository)?;

        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(workdir)
            .output()?;
        Ok(output)
    }

    fn expect_success(op: &'static str, output: &Output) -> Result<()> {
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Command {
                op,
                cause: Self::stderr(output),
            })
        }
    }

    fn stderr(output: &Output) -> String {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}
