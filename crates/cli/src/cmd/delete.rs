//! Delete a single snapshot

use crate::system_config::SystemConfig;
use crate::util;
use anyhow::Result;
use engine::{PruneEngine, Quiet};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(world: Option<&Path>, config: &SystemConfig, name: &str, remote: bool) -> Result<()> {
    let repo = util::open_world(world)?;
    let scope = util::scope_of(remote);

    let owned_name = name.to_string();
    let deleted = util::run_scoped(
        scope,
        &format!("delete {} snapshot {}", scope, name),
        config.remote.timeout(),
        move || PruneEngine::new(&repo, &Quiet).delete_snapshot(scope, &owned_name),
    )
    .await?;

    println!("{} Deleted {} snapshot {}", "✓".green(), scope, deleted.name().yellow());
    Ok(())
}
