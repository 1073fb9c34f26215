//! Apply the retention policy

use crate::system_config::SystemConfig;
use crate::util::{self, ConsoleNotices};
use anyhow::Result;
use engine::PruneEngine;
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(world: Option<&Path>, config: &SystemConfig, remote: bool) -> Result<()> {
    let repo = util::open_world(world)?;
    let scope = util::scope_of(remote);

    let progress = util::spinner(format!("Evaluating {} retention policy...", scope));
    let notices = ConsoleNotices::with_progress(progress.clone());
    let result = util::run_scoped(
        scope,
        &format!("prune {} snapshots", scope),
        config.remote.timeout(),
        move || PruneEngine::new(&repo, &notices).prune(scope),
    )
    .await;
    progress.finish_and_clear();

    match result? {
        // The engine already reported the missing policy
        None => {}
        Some(pruned) if pruned.is_empty() => {
            println!("{} Nothing to prune", "✓".green());
        }
        Some(pruned) => {
            println!("{} Pruned {} {} snapshot(s)", "✓".green(), pruned.len(), scope);
            for sid in &pruned {
                println!("  - {}", sid.name().yellow());
            }
        }
    }
    Ok(())
}
