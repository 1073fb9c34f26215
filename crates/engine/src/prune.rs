//! Pruning snapshot histories
//!
//! Local and remote pruning share one algorithm; the scope only decides which
//! policy key is read, which history is listed and how a branch is deleted:
//! 1. Read the scope's policy string from the repository config
//! 2. Decode it; no policy means nothing is pruned
//! 3. List the scope's history for this world, oldest first
//! 4. Ask the policy which snapshots to drop
//! 5. Delete them one by one, stopping at the first failure
//!
//! There is no rollback. A run that fails halfway leaves some branches
//! deleted; the next run simply no longer sees them.

use crate::notice::{Notice, NoticeSink};
use chrono::{DateTime, Utc};
use retention::{RetentionPolicy, RetentionPolicyCodec, RetentionPolicyType};
use snap_core::config::read_world_uuid;
use snap_core::{sort_world_snapshots, Repo, Result, Scope, SnapshotError, SnapshotHistory, SnapshotId};
use tracing::{debug, info};

/// Applies retention policies to a repository
pub struct PruneEngine<'a, R: ?Sized> {
    repo: &'a R,
    notices: &'a dyn NoticeSink,
    available: &'a [RetentionPolicyType],
    now: DateTime<Utc>,
}

impl<'a, R: Repo + ?Sized> PruneEngine<'a, R> {
    /// Create an engine evaluating policies against the current time
    pub fn new(repo: &'a R, notices: &'a dyn NoticeSink) -> Self {
        Self {
            repo,
            notices,
            available: RetentionPolicyType::available(),
            now: Utc::now(),
        }
    }

    /// Evaluate time-based policies as of `now`
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Restrict which policy types may be configured
    pub fn with_available_types(mut self, available: &'a [RetentionPolicyType]) -> Self {
        self.available = available;
        self
    }

    /// Prune local snapshots; `None` when no local policy is configured
    pub fn prune_local(&self) -> Result<Option<Vec<SnapshotId>>> {
        self.prune(Scope::Local)
    }

    /// Prune remote snapshots; `None` when no remote policy is configured
    pub fn prune_remote(&self) -> Result<Option<Vec<SnapshotId>>> {
        self.prune(Scope::Remote)
    }

    /// Prune one scope and return what was deleted
    pub fn prune(&self, scope: Scope) -> Result<Option<Vec<SnapshotId>>> {
        let Some(policy) = self.retention_policy(scope)? else {
            info!(%scope, "No retention policy set, skipping prune");
            self.notices.notice(Notice::RetentionPolicyNotSet(scope));
            return Ok(None);
        };

        let snapshots = self.list_snapshots(scope)?;
        let to_prune = policy.snapshots_to_prune(&snapshots, self.now);
        debug!(
            %scope,
            %policy,
            history = snapshots.len(),
            prune = to_prune.len(),
            "Evaluated retention policy"
        );

        self.notices.notice(Notice::PruneStarted(scope));
        for sid in &to_prune {
            info!(%scope, snapshot = %sid, "Pruning snapshot");
            self.delete_branch(scope, &sid.branch_name())?;
        }

        Ok(Some(to_prune))
    }

    /// Decoded policy for a scope, `None` when unset
    pub fn retention_policy(&self, scope: Scope) -> Result<Option<RetentionPolicy>> {
        let config = self.repo.get_string(scope.policy_key())?;
        RetentionPolicyCodec::INSTANCE.decode_policy(self.available, config.as_deref())
    }

    /// Validate and store a policy string; an empty string clears the policy
    pub fn set_retention_policy(&self, scope: Scope, config: &str) -> Result<Option<RetentionPolicy>> {
        let policy = RetentionPolicyCodec::INSTANCE.decode_policy(self.available, Some(config))?;
        let encoded = policy
            .as_ref()
            .map(|p| RetentionPolicyCodec::INSTANCE.encode_policy(p))
            .unwrap_or_default();
        self.repo.set_string(scope.policy_key(), &encoded)?;
        info!(%scope, policy = %encoded, "Retention policy updated");
        Ok(policy)
    }

    /// Snapshots of this repository's world in a scope, oldest first
    pub fn list_snapshots(&self, scope: Scope) -> Result<Vec<SnapshotId>> {
        let world = read_world_uuid(self.repo)?;
        let history = self.history(scope)?;
        Ok(sort_world_snapshots(&history, world))
    }

    /// Delete a single named snapshot
    ///
    /// Fails with [`SnapshotError::NotFound`] when the snapshot is not in the
    /// scope's current history.
    pub fn delete_snapshot(&self, scope: Scope, name: &str) -> Result<SnapshotId> {
        let world = read_world_uuid(self.repo)?;
        let requested = SnapshotId::new(world, name)?;
        let history = self.history(scope)?;
        let sid = history
            .get(&requested.branch_name())
            .cloned()
            .ok_or_else(|| SnapshotError::NotFound(format!("{} snapshot '{}'", scope, name)))?;

        info!(%scope, snapshot = %sid, "Deleting snapshot");
        self.delete_branch(scope, &sid.branch_name())?;
        Ok(sid)
    }

    fn history(&self, scope: Scope) -> Result<SnapshotHistory> {
        match scope {
            Scope::Local => self.repo.list_snapshots(),
            Scope::Remote => self.repo.list_remote_snapshots(),
        }
    }

    fn delete_branch(&self, scope: Scope, branch_name: &str) -> Result<()> {
        match scope {
            Scope::Local => self.repo.delete_branch(branch_name),
            Scope::Remote => self.repo.delete_remote_branch(branch_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quiet;
    use chrono::TimeZone;
    use snap_core::memory::MemoryRepo;
    use snap_core::{ConfigKey, RepoConfig};
    use uuid::Uuid;

    fn repo_with_days(days: u32) -> (MemoryRepo, Vec<SnapshotId>) {
        let world = Uuid::new_v4();
        let repo = MemoryRepo::new(world);
        let snapshots: Vec<_> = (1..=days)
            .map(|d| SnapshotId::at(world, Utc.with_ymd_and_hms(2024, 2, d, 10, 0, 0).unwrap()))
            .collect();
        for sid in &snapshots {
            repo.add_snapshot(sid, &[("level.dat", "x")]);
        }
        (repo, snapshots)
    }

    #[test]
    fn test_set_and_read_policy() {
        let (repo, _) = repo_with_days(1);
        let engine = PruneEngine::new(&repo, &Quiet);

        let policy = engine.set_retention_policy(Scope::Local, "  fixed   count=4").unwrap();
        assert_eq!(policy, Some(RetentionPolicy::Fixed { count: 4 }));
        assert_eq!(
            repo.get_string(ConfigKey::LocalRetentionPolicy).unwrap().as_deref(),
            Some("fixed count=4")
        );
        assert_eq!(engine.retention_policy(Scope::Local).unwrap(), policy);
        assert_eq!(engine.retention_policy(Scope::Remote).unwrap(), None);

        assert!(engine.set_retention_policy(Scope::Local, "fixed count=x").is_err());
        assert_eq!(engine.retention_policy(Scope::Local).unwrap(), policy);

        assert_eq!(engine.set_retention_policy(Scope::Local, "").unwrap(), None);
        assert_eq!(engine.retention_policy(Scope::Local).unwrap(), None);
    }

    #[test]
    fn test_delete_snapshot() {
        let (repo, snapshots) = repo_with_days(3);
        let engine = PruneEngine::new(&repo, &Quiet);

        let deleted = engine.delete_snapshot(Scope::Local, snapshots[1].name()).unwrap();
        assert_eq!(deleted, snapshots[1]);
        assert_eq!(
            engine.list_snapshots(Scope::Local).unwrap(),
            vec![snapshots[0].clone(), snapshots[2].clone()]
        );

        let err = engine.delete_snapshot(Scope::Local, snapshots[1].name()).unwrap_err();
        assert!(err.is_not_found());
        assert!(engine.delete_snapshot(Scope::Remote, snapshots[0].name()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_prune_uses_injected_clock() {
        let (repo, snapshots) = repo_with_days(10);
        repo.set_string(ConfigKey::LocalRetentionPolicy, "daily days=3").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 2, 10, 23, 0, 0).unwrap();
        let pruned = PruneEngine::new(&repo, &Quiet).at(now).prune_local().unwrap().unwrap();
        assert_eq!(pruned, snapshots[..6].to_vec());
    }

    #[test]
    fn test_restricted_types() {
        let (repo, _) = repo_with_days(2);
        repo.set_string(ConfigKey::LocalRetentionPolicy, "gfs").unwrap();
        let only_fixed = [RetentionPolicyType::Fixed];
        let engine = PruneEngine::new(&repo, &Quiet).with_available_types(&only_fixed);
        assert!(matches!(engine.prune_local(), Err(SnapshotError::PolicyDecode { .. })));
    }
}
