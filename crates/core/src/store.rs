//! Store capability traits
//!
//! The version-control engine is consumed through these traits. The prune and
//! restore engines never talk to git directly:
//! - [`SnapshotStore`] - local snapshot branches
//! - [`RemoteStore`] - the optional remote replica
//! - [`RepoConfig`] - repository-scoped key/value configuration
//! - [`TreeCheckout`] - materializing a branch into a directory

use crate::{ConfigKey, Result, SnapshotHistory, SnapshotId};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// Which store an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Local,
    Remote,
}

impl Scope {
    /// Config key holding this scope's retention policy
    pub fn policy_key(self) -> ConfigKey {
        match self {
            Scope::Local => ConfigKey::LocalRetentionPolicy,
            Scope::Remote => ConfigKey::RemoteRetentionPolicy,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => f.write_str("local"),
            Scope::Remote => f.write_str("remote"),
        }
    }
}

/// A branch as reported by a store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Short branch name (no `refs/heads/` prefix)
    pub name: String,
    /// Commit time of the branch tip, when the store knows it
    pub commit_time: Option<DateTime<Utc>>,
}

impl BranchRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_time: None,
        }
    }

    pub fn with_commit_time(name: impl Into<String>, commit_time: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.into(),
            commit_time,
        }
    }
}

/// Local snapshot branches
pub trait SnapshotStore {
    /// List every local branch, reflecting the state at call time
    fn list_branches(&self) -> Result<Vec<BranchRef>>;

    /// Force-delete a local branch
    ///
    /// Deleting a branch that does not exist succeeds. Any other rejection
    /// (e.g. the branch is checked out) is an I/O error.
    fn delete_branch(&self, branch_name: &str) -> Result<()>;

    /// Commit the contents of `source_dir` as a new snapshot branch
    ///
    /// Fails if the branch already exists.
    fn create_snapshot(&self, sid: &SnapshotId, source_dir: &Path) -> Result<()>;

    /// Decoded local history
    fn list_snapshots(&self) -> Result<SnapshotHistory> {
        Ok(SnapshotHistory::from_branches(self.list_branches()?))
    }
}

/// Remote replica of the snapshot branches
pub trait RemoteStore {
    /// List every branch on the remote with the commit time of its tip
    ///
    /// Times must match what the local listing reports for the same commit,
    /// so both histories order and prune alike.
    fn list_remote_branches(&self) -> Result<Vec<BranchRef>>;

    /// Remove a branch from the remote by pushing an empty source to it
    ///
    /// Deleting a branch that is already gone succeeds.
    fn delete_remote_branch(&self, branch_name: &str) -> Result<()>;

    /// Push a local branch to the remote
    fn push_branch(&self, branch_name: &str) -> Result<()>;

    /// Decoded remote history
    fn list_remote_snapshots(&self) -> Result<SnapshotHistory> {
        Ok(SnapshotHistory::from_branches(self.list_remote_branches()?))
    }
}

/// Repository-scoped key/value configuration
pub trait RepoConfig {
    /// Read a value; `None` when unset
    fn get_string(&self, key: ConfigKey) -> Result<Option<String>>;

    fn set_string(&self, key: ConfigKey, value: &str) -> Result<()>;
}

/// Materializes the tree of a branch from a local or remote source
pub trait TreeCheckout {
    /// Whether `branch_name` exists at `uri`
    fn branch_exists(&self, uri: &str, branch_name: &str) -> Result<bool>;

    /// Write the tree of `branch_name` into the (existing, empty) `target` directory
    fn checkout(&self, uri: &str, branch_name: &str, target: &Path) -> Result<()>;
}

/// Everything the prune engine needs from a repository
pub trait Repo: SnapshotStore + RemoteStore + RepoConfig {}

impl<T: SnapshotStore + RemoteStore + RepoConfig + ?Sized> Repo for T {}
