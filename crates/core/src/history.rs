//! Snapshot history of one store

use crate::store::BranchRef;
use crate::SnapshotId;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Mapping from branch name to decoded snapshot id, for a single store
///
/// Local and remote histories are built independently and are never assumed
/// to agree.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHistory {
    by_branch: BTreeMap<String, SnapshotId>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw branch listing
    ///
    /// Branches that are not snapshot branches are skipped.
    pub fn from_branches(branches: impl IntoIterator<Item = BranchRef>) -> Self {
        let mut history = Self::new();
        for branch in branches {
            match SnapshotId::parse(&branch.name) {
                Ok(sid) => history.insert(sid.with_created_at(branch.commit_time)),
                Err(_) => tracing::trace!(branch = %branch.name, "Skipping non-snapshot branch"),
            }
        }
        history
    }

    pub fn insert(&mut self, sid: SnapshotId) {
        self.by_branch.insert(sid.branch_name(), sid);
    }

    pub fn get(&self, branch_name: &str) -> Option<&SnapshotId> {
        self.by_branch.get(branch_name)
    }

    pub fn contains(&self, sid: &SnapshotId) -> bool {
        self.by_branch.contains_key(&sid.branch_name())
    }

    pub fn len(&self) -> usize {
        self.by_branch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_branch.is_empty()
    }

}

/// Snapshots of one world, oldest first
pub fn sort_world_snapshots(history: &SnapshotHistory, world_uuid: Uuid) -> Vec<SnapshotId> {
    let mut snapshots: Vec<SnapshotId> = history
        .by_branch
        .values()
        .filter(|sid| sid.world_uuid() == world_uuid)
        .cloned()
        .collect();
    snapshots.sort();
    snapshots
}
