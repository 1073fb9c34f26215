//! Start tracking a world directory

use crate::util;
use anyhow::{Context, Result};
use git::GitRepo;
use owo_colors::OwoColorize;
use std::path::Path;
use uuid::Uuid;

pub async fn run(world: Option<&Path>, remote: Option<&str>, remote_name: &str) -> Result<()> {
    let dir = util::world_dir(world)?;

    // Re-running init keeps the existing world UUID
    let repo = GitRepo::init(&dir, Uuid::new_v4())
        .with_context(|| format!("Failed to initialize {}", dir.display()))?;
    let world_uuid = repo.world_uuid()?;

    println!("{} Tracking world at {}", "✓".green(), repo.work_dir().display());
    println!("  World UUID: {}", world_uuid.to_string().cyan());

    if let Some(url) = remote {
        repo.set_remote(remote_name, url)
            .with_context(|| format!("Failed to configure remote {}", remote_name))?;
        println!("  Remote:     {} {}", remote_name.cyan(), format!("({})", url).dimmed());
    }

    println!();
    println!("Next steps:");
    println!("  - Run 'wsnap snapshot' to take a first snapshot");
    println!("  - Run 'wsnap set-retention fixed count=10' to bound local history");
    Ok(())
}
