//! Take a snapshot of the live world

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use snap_core::{SnapshotId, SnapshotStore};
use std::path::Path;

pub async fn run(world: Option<&Path>, name: Option<&str>) -> Result<()> {
    let repo = util::open_world(world)?;
    let world_uuid = repo.world_uuid()?;

    let sid = match name {
        Some(name) => SnapshotId::new(world_uuid, name)?,
        None => SnapshotId::now(world_uuid),
    };

    let progress = util::spinner(format!("Snapshotting {}...", sid.name()));
    let result = repo.create_snapshot(&sid, repo.work_dir());
    progress.finish_and_clear();
    result.with_context(|| format!("Failed to create snapshot {}", sid))?;

    println!("{} Created snapshot {}", "✓".green(), sid.name().yellow());
    println!("  Branch: {}", sid.branch_name().dimmed());
    Ok(())
}
