//! List a store's snapshots

use crate::system_config::SystemConfig;
use crate::util;
use anyhow::Result;
use chrono::Utc;
use engine::{PruneEngine, Quiet};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(world: Option<&Path>, config: &SystemConfig, remote: bool) -> Result<()> {
    let repo = util::open_world(world)?;
    let world_uuid = repo.world_uuid()?;
    let scope = util::scope_of(remote);

    let policy = PruneEngine::new(&repo, &Quiet).retention_policy(scope);

    let listing_repo = repo.clone();
    let snapshots = util::run_scoped(
        scope,
        &format!("list {} snapshots", scope),
        config.remote.timeout(),
        move || PruneEngine::new(&listing_repo, &Quiet).list_snapshots(scope),
    )
    .await?;

    println!("{} {}", format!("{} snapshots of world", scope).bold(), world_uuid.to_string().dimmed());
    if snapshots.is_empty() {
        println!("{}", "No snapshots".dimmed());
    } else {
        let now = Utc::now();
        for sid in &snapshots {
            util::display_snapshot(sid, now);
        }
    }

    println!();
    match policy {
        Ok(Some(policy)) => println!("Retention: {} {}", policy.cyan(), format!("({})", policy.describe()).dimmed()),
        Ok(None) => println!("Retention: {}", "not set, keeping every snapshot".dimmed()),
        Err(e) => println!("Retention: {} {}", "invalid".red(), e),
    }
    Ok(())
}
