//! Checking snapshot branches out of a local or remote repository

use crate::command::{remote_failure, GitCommand};
use snap_core::{Result, SnapshotError, TreeCheckout};
use std::fs;
use std::path::Path;
use tracing::debug;

/// [`TreeCheckout`] backed by `git ls-remote` and a shallow clone
///
/// Only the requested branch tip is fetched. The clone's `.git` directory is
/// removed afterwards so the restored directory is a plain world folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCheckout;

impl GitCheckout {
    pub fn new() -> Self {
        Self
    }
}

impl TreeCheckout for GitCheckout {
    fn branch_exists(&self, uri: &str, branch_name: &str) -> Result<bool> {
        let description = format!("look up {} at {}", branch_name, uri);
        let output = GitCommand::new(description.as_str())
            .args(["ls-remote", "--heads", uri])
            .arg(format!("refs/heads/{}", branch_name))
            .output()?;

        if !output.success() {
            return Err(remote_failure(&description, &output));
        }
        Ok(!output.stdout.trim().is_empty())
    }

    fn checkout(&self, uri: &str, branch_name: &str, target: &Path) -> Result<()> {
        let description = format!("check out {} from {}", branch_name, uri);
        let output = GitCommand::new(description.as_str())
            .args([
                "clone",
                "--quiet",
                "--no-tags",
                "--single-branch",
                "--depth",
                "1",
                "--branch",
                branch_name,
                uri,
            ])
            .arg(target)
            .output()?;

        if !output.success() {
            return Err(remote_failure(&description, &output));
        }

        let clone_git_dir = target.join(".git");
        fs::remove_dir_all(&clone_git_dir).map_err(|e| {
            SnapshotError::io(format!("failed to remove {}", clone_git_dir.display()), e)
        })?;
        debug!(branch = branch_name, target = %target.display(), "Checked out snapshot tree");
        Ok(())
    }
}
