//! Push a snapshot to the remote replica

use crate::system_config::SystemConfig;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use snap_core::{RemoteStore, SnapshotId, SnapshotStore};
use std::path::Path;

pub async fn run(world: Option<&Path>, config: &SystemConfig, name: &str) -> Result<()> {
    // 1. Resolve the snapshot locally
    let repo = util::open_world(world)?;
    let sid = SnapshotId::new(repo.world_uuid()?, name)?;
    if !repo.list_snapshots()?.contains(&sid) {
        anyhow::bail!("Snapshot not found locally: {}", name);
    }

    // 2. Pre-push validation: the remote must be configured
    let remote_name = repo.remote_name()?;
    if repo.remote_url()?.is_none() {
        println!("{} No remote named '{}' configured.", "Warning:".yellow(), remote_name);
        println!("{}", "Add one first: wsnap init --remote <url>".dimmed());
        anyhow::bail!("No remote configured");
    }

    // 3. Push under the remote timeout
    let progress = util::spinner(format!("Pushing {} to {}...", name, remote_name));
    let branch = sid.branch_name();
    let result = util::run_with_timeout(
        &format!("push {} to {}", name, remote_name),
        config.remote.timeout(),
        move || repo.push_branch(&branch),
    )
    .await;
    progress.finish_and_clear();
    result?;

    println!("{} Pushed {} to {}", "✓".green(), sid.name().yellow(), remote_name.cyan());
    Ok(())
}
