//! Retention policy commands

use crate::util;
use anyhow::{Context, Result};
use engine::{PruneEngine, Quiet};
use owo_colors::OwoColorize;
use retention::RetentionPolicyType;
use std::path::Path;

/// Validate and store a scope's policy; an empty policy clears it
pub async fn run_set(world: Option<&Path>, remote: bool, policy: &str) -> Result<()> {
    let repo = util::open_world(world)?;
    let scope = util::scope_of(remote);

    let stored = PruneEngine::new(&repo, &Quiet)
        .set_retention_policy(scope, policy)
        .with_context(|| format!("{} retention policy not changed", scope))?;

    match stored {
        Some(policy) => {
            println!("{} {} retention policy: {}", "✓".green(), scope, policy.cyan());
            println!("  {}", policy.describe().dimmed());
        }
        None => {
            println!("{} Cleared {} retention policy, keeping every snapshot", "✓".green(), scope);
        }
    }
    Ok(())
}

/// Describe every policy type that can be configured
pub async fn run_types() -> Result<()> {
    println!("{}", "Retention policy types".bold());
    println!();

    for policy_type in RetentionPolicyType::available() {
        let mut usage = policy_type.key().to_string();
        for param in policy_type.params() {
            usage.push_str(&format!(" {}=<n>", param.name));
        }

        println!("{}", usage.cyan());
        println!("  {}", policy_type.description());
        for param in policy_type.params() {
            println!(
                "    {} {} {}",
                param.name.yellow(),
                param.description,
                format!("(at least {})", param.min).dimmed()
            );
        }
        println!();
    }

    println!("{}", "With no policy set every snapshot is kept.".dimmed());
    Ok(())
}
