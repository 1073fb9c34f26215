//! In-memory repository
//!
//! Implements every store trait without git. Used by the engine tests and
//! handy for dry runs. Failure injection hooks let tests exercise the
//! partial-failure paths.

use crate::store::{BranchRef, RemoteStore, RepoConfig, SnapshotStore, TreeCheckout};
use crate::{ConfigKey, Result, SnapshotError, SnapshotId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URI that selects the remote side in [`TreeCheckout`]
pub const MEMORY_REMOTE_URI: &str = "memory://remote";

/// URI that selects the local side in [`TreeCheckout`]
pub const MEMORY_LOCAL_URI: &str = "memory://local";

/// Recorded content of one branch
#[derive(Debug, Clone, Default)]
pub struct MemoryBranch {
    pub commit_time: Option<DateTime<Utc>>,
    pub files: BTreeMap<PathBuf, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Faults {
    /// Local deletes allowed before every further delete fails
    local_deletes_left: Option<usize>,
    /// Remote deletes allowed before every further delete fails
    remote_deletes_left: Option<usize>,
    remote_unreachable: bool,
    checkout_fails: bool,
}

/// Repository held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryRepo {
    local: Mutex<BTreeMap<String, MemoryBranch>>,
    remote: Mutex<BTreeMap<String, MemoryBranch>>,
    config: Mutex<HashMap<ConfigKey, String>>,
    faults: Mutex<Faults>,
    deletes: Mutex<Vec<(bool, String)>>,
}

impl MemoryRepo {
    /// Create an empty repository for the given world
    pub fn new(world_uuid: Uuid) -> Self {
        let repo = Self::default();
        repo.config
            .lock()
            .insert(ConfigKey::WorldUuid, world_uuid.hyphenated().to_string());
        repo
    }

    /// Add a local snapshot with the given files
    pub fn add_snapshot(&self, sid: &SnapshotId, files: &[(&str, &str)]) {
        let branch = MemoryBranch {
            commit_time: sid.created_at(),
            files: files
                .iter()
                .map(|(path, content)| (PathBuf::from(path), content.as_bytes().to_vec()))
                .collect(),
        };
        self.local.lock().insert(sid.branch_name(), branch);
    }

    /// Add a local branch that is not a snapshot
    pub fn add_foreign_branch(&self, name: &str) {
        self.local.lock().insert(name.to_string(), MemoryBranch::default());
    }

    /// Add a branch directly on the remote side
    pub fn add_remote_branch(&self, name: &str) {
        self.remote.lock().insert(name.to_string(), MemoryBranch::default());
    }

    pub fn local_branch_names(&self) -> Vec<String> {
        self.local.lock().keys().cloned().collect()
    }

    pub fn remote_branch_names(&self) -> Vec<String> {
        self.remote.lock().keys().cloned().collect()
    }

    /// Number of delete calls made so far, local and remote
    pub fn delete_calls(&self) -> usize {
        self.deletes.lock().len()
    }

    /// Let `n` more local deletes succeed, then fail
    pub fn fail_local_deletes_after(&self, n: usize) {
        self.faults.lock().local_deletes_left = Some(n);
    }

    /// Let `n` more remote deletes succeed, then fail
    pub fn fail_remote_deletes_after(&self, n: usize) {
        self.faults.lock().remote_deletes_left = Some(n);
    }

    /// Make every remote call fail as if the network were down
    pub fn set_remote_unreachable(&self, unreachable: bool) {
        self.faults.lock().remote_unreachable = unreachable;
    }

    /// Make checkouts fail after writing the first file
    pub fn set_checkout_fails(&self, fails: bool) {
        self.faults.lock().checkout_fails = fails;
    }

    fn check_remote(&self) -> Result<()> {
        if self.faults.lock().remote_unreachable {
            return Err(SnapshotError::io_message(
                "remote unreachable",
                "connection refused",
            ));
        }
        Ok(())
    }

    fn take_delete_budget(slot: &mut Option<usize>, branch_name: &str) -> Result<()> {
        match slot {
            Some(0) => Err(SnapshotError::io_message(
                format!("failed to delete branch {}", branch_name),
                "injected failure",
            )),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn listing(branches: &BTreeMap<String, MemoryBranch>) -> Vec<BranchRef> {
    // Reverse order so callers cannot rely on listing order
    branches
        .iter()
        .rev()
        .map(|(name, branch)| BranchRef::with_commit_time(name.clone(), branch.commit_time))
        .collect()
}

fn read_tree(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, Vec<u8>>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if entry.file_name() == ".git" {
                continue;
            }
            read_tree(root, &path, files)?;
        } else {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.insert(relative, fs::read(&path)?);
        }
    }
    Ok(())
}

impl SnapshotStore for MemoryRepo {
    fn list_branches(&self) -> Result<Vec<BranchRef>> {
        Ok(listing(&self.local.lock()))
    }

    fn delete_branch(&self, branch_name: &str) -> Result<()> {
        Self::take_delete_budget(&mut self.faults.lock().local_deletes_left, branch_name)?;
        self.deletes.lock().push((false, branch_name.to_string()));
        self.local.lock().remove(branch_name);
        Ok(())
    }

    fn create_snapshot(&self, sid: &SnapshotId, source_dir: &Path) -> Result<()> {
        let branch_name = sid.branch_name();
        if self.local.lock().contains_key(&branch_name) {
            return Err(SnapshotError::io_message(
                format!("failed to create snapshot {}", sid),
                "branch already exists",
            ));
        }

        let mut files = BTreeMap::new();
        read_tree(source_dir, source_dir, &mut files)
            .map_err(|e| SnapshotError::io(format!("failed to read {}", source_dir.display()), e))?;

        let branch = MemoryBranch {
            commit_time: Some(sid.created_at().unwrap_or_else(Utc::now)),
            files,
        };
        self.local.lock().insert(branch_name, branch);
        Ok(())
    }
}

impl RemoteStore for MemoryRepo {
    fn list_remote_branches(&self) -> Result<Vec<BranchRef>> {
        self.check_remote()?;
        Ok(listing(&self.remote.lock()))
    }

    fn delete_remote_branch(&self, branch_name: &str) -> Result<()> {
        self.check_remote()?;
        Self::take_delete_budget(&mut self.faults.lock().remote_deletes_left, branch_name)?;
        self.deletes.lock().push((true, branch_name.to_string()));
        self.remote.lock().remove(branch_name);
        Ok(())
    }

    fn push_branch(&self, branch_name: &str) -> Result<()> {
        self.check_remote()?;
        let branch = self
            .local
            .lock()
            .get(branch_name)
            .cloned()
            .ok_or_else(|| SnapshotError::NotFound(branch_name.to_string()))?;
        self.remote.lock().insert(branch_name.to_string(), branch);
        Ok(())
    }
}

impl RepoConfig for MemoryRepo {
    fn get_string(&self, key: ConfigKey) -> Result<Option<String>> {
        Ok(self.config.lock().get(&key).cloned())
    }

    fn set_string(&self, key: ConfigKey, value: &str) -> Result<()> {
        self.config.lock().insert(key, value.to_string());
        Ok(())
    }
}

impl TreeCheckout for MemoryRepo {
    fn branch_exists(&self, uri: &str, branch_name: &str) -> Result<bool> {
        if uri == MEMORY_REMOTE_URI {
            self.check_remote()?;
            Ok(self.remote.lock().contains_key(branch_name))
        } else {
            Ok(self.local.lock().contains_key(branch_name))
        }
    }

    fn checkout(&self, uri: &str, branch_name: &str, target: &Path) -> Result<()> {
        let branch = if uri == MEMORY_REMOTE_URI {
            self.check_remote()?;
            self.remote.lock().get(branch_name).cloned()
        } else {
            self.local.lock().get(branch_name).cloned()
        }
        .ok_or_else(|| SnapshotError::NotFound(branch_name.to_string()))?;

        let checkout_fails = self.faults.lock().checkout_fails;
        for (index, (path, content)) in branch.files.iter().enumerate() {
            if checkout_fails && index > 0 {
                return Err(SnapshotError::io_message(
                    format!("checkout of {} interrupted", branch_name),
                    "injected failure",
                ));
            }
            let file_path = target.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| SnapshotError::io(format!("failed to create {}", parent.display()), e))?;
            }
            fs::write(&file_path, content)
                .map_err(|e| SnapshotError::io(format!("failed to write {}", file_path.display()), e))?;
        }
        Ok(())
    }
}
