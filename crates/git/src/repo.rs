//! Snapshot branches stored in a world's git repository
//!
//! The world directory is the work tree. Snapshots are commits on
//! `snapshots/<world-uuid>/<name>` branches built from a private index, so
//! taking a snapshot never touches the work tree, `HEAD` or the regular index.

use crate::command::{failure, remote_failure, GitCommand};
use chrono::{DateTime, TimeZone, Utc};
use snap_core::config::{read_remote_name, read_world_uuid};
use snap_core::{BranchRef, ConfigKey, RemoteStore, RepoConfig, Result, SnapshotError, SnapshotId, SnapshotStore};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const HEADS_PREFIX: &str = "refs/heads/";

/// Identity recorded on snapshot commits
const SNAPSHOT_AUTHOR_NAME: &str = "worldsnap";
const SNAPSHOT_AUTHOR_EMAIL: &str = "worldsnap@localhost";

/// A world directory backed by a git repository
#[derive(Debug, Clone)]
pub struct GitRepo {
    work_dir: PathBuf,
    git_dir: PathBuf,
}

impl GitRepo {
    /// Initialize (or reuse) a repository in `work_dir` and record the world UUID
    ///
    /// An existing `worldsnap.world-uuid` is left alone so re-running init
    /// never orphans earlier snapshots.
    pub fn init(work_dir: &Path, world_uuid: Uuid) -> Result<Self> {
        fs::create_dir_all(work_dir)
            .map_err(|e| SnapshotError::io(format!("failed to create {}", work_dir.display()), e))?;

        GitCommand::new("initialize repository")
            .args(["init", "--quiet"])
            .arg(work_dir)
            .run()?;

        let repo = Self::open(work_dir)?;
        if repo.get_string(ConfigKey::WorldUuid)?.is_none() {
            repo.set_string(ConfigKey::WorldUuid, &world_uuid.to_string())?;
            info!(world = %world_uuid, path = %repo.work_dir.display(), "Initialized world repository");
        }
        Ok(repo)
    }

    /// Open the repository whose work tree is `work_dir`
    pub fn open(work_dir: &Path) -> Result<Self> {
        let work_dir = fs::canonicalize(work_dir)
            .map_err(|e| SnapshotError::io(format!("failed to open {}", work_dir.display()), e))?;
        let git_dir = work_dir.join(".git");
        if !git_dir.is_dir() {
            return Err(SnapshotError::Config(format!(
                "{} is not a world repository (no .git directory)",
                work_dir.display()
            )));
        }
        Ok(Self { work_dir, git_dir })
    }

    /// Walk up from `start` to the nearest directory with a `.git` directory
    pub fn discover(start: &Path) -> Result<Self> {
        let start = fs::canonicalize(start)
            .map_err(|e| SnapshotError::io(format!("failed to open {}", start.display()), e))?;
        let mut current = start.as_path();
        loop {
            if current.join(".git").is_dir() {
                return Self::open(current);
            }
            current = current.parent().ok_or_else(|| {
                SnapshotError::Config(format!("no world repository found above {}", start.display()))
            })?;
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The world this repository snapshots
    pub fn world_uuid(&self) -> Result<Uuid> {
        read_world_uuid(self)
    }

    /// URI a [`crate::GitCheckout`] can restore local snapshots from
    pub fn local_uri(&self) -> String {
        format!("file://{}", self.work_dir.display())
    }

    /// Name of the configured snapshot remote
    pub fn remote_name(&self) -> Result<String> {
        read_remote_name(self)
    }

    /// URL of the snapshot remote, if one is configured
    pub fn remote_url(&self) -> Result<Option<String>> {
        let name = self.remote_name()?;
        self.config_get(&format!("remote.{}.url", name))
    }

    /// Add or update remote `name` and make it the snapshot remote
    pub fn set_remote(&self, name: &str, url: &str) -> Result<()> {
        let exists = self.config_get(&format!("remote.{}.url", name))?.is_some();
        let action = if exists { "set-url" } else { "add" };
        self.git(format!("configure remote {}", name))
            .args(["remote", action, name, url])
            .run()?;
        self.set_string(ConfigKey::RemoteName, name)?;
        info!(remote = name, url, "Configured snapshot remote");
        Ok(())
    }

    fn git(&self, description: impl Into<String>) -> GitCommand {
        GitCommand::new(description).git_dir(&self.git_dir)
    }

    fn config_get(&self, key: &str) -> Result<Option<String>> {
        let description = format!("read config {}", key);
        let output = self.git(description.as_str()).args(["config", "--get", key]).output()?;
        match output.code {
            Some(0) => Ok(Some(output.stdout.trim_end_matches(['\n', '\r']).to_string())),
            // Exit status 1 means the key is not set
            Some(1) => Ok(None),
            _ => Err(failure(&description, &output)),
        }
    }

    fn rev_parse(&self, rev: &str) -> Result<Option<String>> {
        let output = self
            .git(format!("resolve {}", rev))
            .args(["rev-parse", "--verify", "--quiet", rev])
            .output()?;
        Ok(output.success().then(|| output.stdout.trim().to_string()))
    }

    /// Stage `source_dir` into a throwaway index and return the tree id
    fn write_tree(&self, source_dir: &Path) -> Result<String> {
        let index_dir = tempfile::tempdir()
            .map_err(|e| SnapshotError::io("failed to create temporary index directory", e))?;
        let index_file = index_dir.path().join("index");

        self.git(format!("stage {}", source_dir.display()))
            .work_tree(source_dir)
            .current_dir(source_dir)
            .env("GIT_INDEX_FILE", &index_file)
            .args(["add", "--all", "."])
            .run()?;

        let tree = self
            .git("write snapshot tree")
            .env("GIT_INDEX_FILE", &index_file)
            .arg("write-tree")
            .run()?;
        Ok(tree.trim().to_string())
    }

    fn commit_tree(&self, sid: &SnapshotId, tree: &str) -> Result<String> {
        let mut command = self
            .git(format!("commit snapshot {}", sid))
            .args(["commit-tree", tree, "-m"])
            .arg(format!("Snapshot {}", sid.name()))
            .env("GIT_AUTHOR_NAME", SNAPSHOT_AUTHOR_NAME)
            .env("GIT_AUTHOR_EMAIL", SNAPSHOT_AUTHOR_EMAIL)
            .env("GIT_COMMITTER_NAME", SNAPSHOT_AUTHOR_NAME)
            .env("GIT_COMMITTER_EMAIL", SNAPSHOT_AUTHOR_EMAIL);

        if let Some(created_at) = sid.created_at() {
            let date = format!("{} +0000", created_at.timestamp());
            command = command
                .env("GIT_AUTHOR_DATE", &date)
                .env("GIT_COMMITTER_DATE", &date);
        }

        Ok(command.run()?.trim().to_string())
    }

    /// The subset of `oids` naming commits present in this repository
    fn present_commits<'o>(&self, oids: &[&'o str]) -> Result<Vec<&'o str>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        let stdout = self
            .git("look up commits")
            .args(["cat-file", "--batch-check=%(objectname) %(objecttype)"])
            .input(format!("{}\n", oids.join("\n")))
            .run()?;
        let found: HashSet<&str> = stdout.lines().filter_map(|line| line.strip_suffix(" commit")).collect();
        Ok(oids.iter().copied().filter(|oid| found.contains(oid)).collect())
    }

    /// Commit times of the given objects that exist in this repository
    fn commit_times(&self, oids: &[&str]) -> Result<HashMap<String, DateTime<Utc>>> {
        let present = self.present_commits(oids)?;
        if present.is_empty() {
            return Ok(HashMap::new());
        }
        let stdout = self
            .git("read commit times")
            .args(["log", "--no-walk=unsorted", "--format=%H%x09%ct"])
            .args(&present)
            .run()?;
        Ok(stdout.lines().filter_map(parse_time_line).collect())
    }

    /// Commit times of remote branch tips, keyed by branch name
    ///
    /// Tips pushed from here are already present. The others are fetched
    /// without updating any ref; their objects stay until the next gc.
    fn remote_commit_times(
        &self,
        remote: &str,
        heads: &[RemoteHead],
    ) -> Result<HashMap<String, DateTime<Utc>>> {
        let oids: Vec<&str> = heads.iter().map(|head| head.oid.as_str()).collect();
        let mut by_oid = self.commit_times(&oids)?;

        let missing: Vec<&RemoteHead> = heads.iter().filter(|head| !by_oid.contains_key(&head.oid)).collect();
        if !missing.is_empty() {
            let description = format!("fetch {} snapshot tip(s) from {}", missing.len(), remote);
            let output = self
                .git(description.as_str())
                .args(["fetch", "--quiet", "--no-tags", "--refmap=", remote])
                .args(missing.iter().map(|head| format!("{}{}", HEADS_PREFIX, head.name)))
                .output()?;
            if !output.success() {
                return Err(remote_failure(&description, &output));
            }

            let oids: Vec<&str> = missing.iter().map(|head| head.oid.as_str()).collect();
            by_oid.extend(self.commit_times(&oids)?);
        }

        Ok(heads
            .iter()
            .filter_map(|head| by_oid.get(&head.oid).map(|time| (head.name.clone(), *time)))
            .collect())
    }
}

/// A branch tip as reported by `ls-remote`
#[derive(Debug, Clone, PartialEq, Eq)]
struct RemoteHead {
    oid: String,
    name: String,
}

fn parse_unix_time(field: &str) -> Option<DateTime<Utc>> {
    field
        .split_whitespace()
        .next()
        .and_then(|secs| secs.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Parse one `for-each-ref` line: `<refname>\t<unix-seconds> <tz>`
fn parse_ref_line(line: &str) -> Option<BranchRef> {
    let (refname, date) = line.split_once('\t').unwrap_or((line, ""));
    let name = refname.strip_prefix(HEADS_PREFIX)?;
    Some(BranchRef::with_commit_time(name, parse_unix_time(date)))
}

/// Parse one `ls-remote` line: `<object-id>\t<refname>`
fn parse_remote_line(line: &str) -> Option<RemoteHead> {
    let (oid, refname) = line.split_once('\t')?;
    let name = refname.strip_prefix(HEADS_PREFIX)?;
    Some(RemoteHead {
        oid: oid.to_string(),
        name: name.to_string(),
    })
}

/// Parse one `log --format=%H%x09%ct` line
fn parse_time_line(line: &str) -> Option<(String, DateTime<Utc>)> {
    let (oid, secs) = line.split_once('\t')?;
    Some((oid.to_string(), parse_unix_time(secs)?))
}

impl SnapshotStore for GitRepo {
    fn list_branches(&self) -> Result<Vec<BranchRef>> {
        let stdout = self
            .git("list branches")
            .args(["for-each-ref", "--format=%(refname)%09%(committerdate:raw)", HEADS_PREFIX])
            .run()?;
        Ok(stdout.lines().filter_map(parse_ref_line).collect())
    }

    fn delete_branch(&self, branch_name: &str) -> Result<()> {
        let description = format!("delete branch {}", branch_name);
        let output = self.git(description.as_str()).args(["branch", "-D", branch_name]).output()?;
        if output.success() {
            debug!(branch = branch_name, "Deleted local branch");
            return Ok(());
        }
        if output.stderr.contains("not found") {
            warn!(branch = branch_name, "Branch already absent");
            return Ok(());
        }
        Err(failure(&description, &output))
    }

    fn create_snapshot(&self, sid: &SnapshotId, source_dir: &Path) -> Result<()> {
        let branch_name = sid.branch_name();
        let refname = format!("{}{}", HEADS_PREFIX, branch_name);
        if self.rev_parse(&refname)?.is_some() {
            return Err(SnapshotError::io_message(
                format!("create snapshot {}", sid),
                format!("branch {} already exists", branch_name),
            ));
        }

        let tree = self.write_tree(source_dir)?;
        let commit = self.commit_tree(sid, &tree)?;

        // Empty old value: refuse to overwrite a branch created concurrently
        self.git(format!("create branch {}", branch_name))
            .args(["update-ref", "-m", "worldsnap: snapshot", &refname, &commit, ""])
            .run()?;

        info!(snapshot = %sid, commit = %commit, "Created snapshot");
        Ok(())
    }
}

impl RemoteStore for GitRepo {
    fn list_remote_branches(&self) -> Result<Vec<BranchRef>> {
        let remote = self.remote_name()?;
        let description = format!("list branches on {}", remote);
        let output = self.git(description.as_str()).args(["ls-remote", "--heads", &remote]).output()?;
        if !output.success() {
            return Err(remote_failure(&description, &output));
        }

        let heads: Vec<RemoteHead> = output.stdout.lines().filter_map(parse_remote_line).collect();
        let mut times = self.remote_commit_times(&remote, &heads)?;
        Ok(heads
            .into_iter()
            .map(|head| {
                let commit_time = times.remove(&head.name);
                BranchRef::with_commit_time(head.name, commit_time)
            })
            .collect())
    }

    fn delete_remote_branch(&self, branch_name: &str) -> Result<()> {
        let remote = self.remote_name()?;
        let description = format!("delete {} on {}", branch_name, remote);
        let output = self
            .git(description.as_str())
            .args(["push", "--quiet", &remote])
            .arg(format!(":{}{}", HEADS_PREFIX, branch_name))
            .output()?;

        if output.success() {
            debug!(branch = branch_name, remote = %remote, "Deleted remote branch");
            return Ok(());
        }
        if output.stderr.contains("remote ref does not exist") {
            warn!(branch = branch_name, remote = %remote, "Remote branch already absent");
            return Ok(());
        }
        Err(remote_failure(&description, &output))
    }

    fn push_branch(&self, branch_name: &str) -> Result<()> {
        let remote = self.remote_name()?;
        let description = format!("push {} to {}", branch_name, remote);
        let refspec = format!("{0}{1}:{0}{1}", HEADS_PREFIX, branch_name);
        let output = self
            .git(description.as_str())
            .args(["push", "--quiet", &remote, &refspec])
            .output()?;

        if !output.success() {
            return Err(remote_failure(&description, &output));
        }
        info!(branch = branch_name, remote = %remote, "Pushed snapshot");
        Ok(())
    }
}

impl RepoConfig for GitRepo {
    fn get_string(&self, key: ConfigKey) -> Result<Option<String>> {
        self.config_get(&key.qualified())
    }

    fn set_string(&self, key: ConfigKey, value: &str) -> Result<()> {
        self.git(format!("write config {}", key))
            .args(["config", &key.qualified(), value])
            .run()?;
        Ok(())
    }
}
