//! Restore a snapshot into a new directory

use crate::system_config::SystemConfig;
use crate::util::{self, ConsoleNotices};
use anyhow::{Context, Result};
use engine::RestoreEngine;
use git::GitCheckout;
use owo_colors::OwoColorize;
use snap_core::SnapshotId;
use std::path::{Path, PathBuf};

pub async fn run(
    world: Option<&Path>,
    config: &SystemConfig,
    name: &str,
    from_remote: bool,
    world_name: Option<String>,
    into: Option<PathBuf>,
) -> Result<()> {
    let repo = util::open_world(world)?;
    let sid = SnapshotId::new(repo.world_uuid()?, name)?;

    let uri = if from_remote {
        repo.remote_url()?
            .with_context(|| format!("No remote named '{}' configured", repo.remote_name().unwrap_or_default()))?
    } else {
        repo.local_uri()
    };

    let world_name = world_name
        .or_else(|| {
            repo.work_dir()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "world".to_string());

    let restores_dir = match into {
        Some(dir) => dir,
        None => config.restores_dir()?,
    };

    let progress = util::spinner(format!("Restoring {}...", name));
    let notices = ConsoleNotices::with_progress(progress.clone());
    let result = util::run_scoped(
        util::scope_of(from_remote),
        &format!("restore {}", name),
        config.remote.timeout(),
        move || RestoreEngine::new(&GitCheckout, &notices).restore(&uri, &restores_dir, &world_name, &sid),
    )
    .await;
    progress.finish_and_clear();
    result?;

    println!("{}", "The live world was not modified.".dimmed());
    Ok(())
}
