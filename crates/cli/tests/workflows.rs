//! End-to-end workflows through the `wsnap` binary
//!
//! Tests that need git return early when it is not installed.

mod common;

use anyhow::Result;
use common::TestWorld;
use std::fs;

macro_rules! require_git {
    () => {
        if !git::git_available() {
            eprintln!("git not installed, skipping");
            return Ok(());
        }
    };
}

/// Init the world and take snapshots named `names`, rewriting level.dat before each
fn init_with_snapshots(world: &TestWorld, names: &[&str]) -> Result<()> {
    let dir = world.world_arg();
    wsnap!(world.root(), "-C", &dir, "init").assert_success()?;
    for name in names {
        world.write_level(&format!("state at {}", name))?;
        wsnap!(world.root(), "-C", &dir, "snapshot", "--name", name).assert_success()?;
    }
    Ok(())
}

#[test]
fn test_retention_types_lists_every_type() -> Result<()> {
    let world = TestWorld::new()?;
    let result = wsnap!(world.root(), "retention-types").assert_success()?;

    assert!(result.contains_stdout("fixed count=<n>"));
    assert!(result.contains_stdout("daily days=<n>"));
    assert!(result.contains_stdout("gfs"));
    Ok(())
}

#[test]
fn test_config_set_and_get() -> Result<()> {
    let world = TestWorld::new()?;

    wsnap!(world.root(), "config", "set", "remote.timeout_secs", "30").assert_success()?;
    let result = wsnap!(world.root(), "config", "get", "remote.timeout_secs").assert_success()?;
    assert_eq!(result.stdout.trim(), "30");

    let result = wsnap!(world.root(), "config", "set", "remote.timeout_secs", "0").assert_failure()?;
    assert!(result.contains_stderr("timeout_secs"));

    let result = wsnap!(world.root(), "config", "get", "gc.retain_count").assert_failure()?;
    assert!(result.contains_stderr("Unknown config key"));
    Ok(())
}

#[test]
fn test_commands_outside_a_world_fail() -> Result<()> {
    let world = TestWorld::new()?;
    let dir = world.world_arg();

    let result = wsnap!(world.root(), "-C", &dir, "list").assert_failure()?;
    assert!(result.contains_stderr("wsnap init"));
    Ok(())
}

#[test]
fn test_snapshot_list_and_prune() -> Result<()> {
    require_git!();
    let world = TestWorld::new()?;
    let dir = world.world_arg();
    init_with_snapshots(&world, &["s1", "s2", "s3", "s4", "s5"])?;

    let result = wsnap!(world.root(), "-C", &dir, "list").assert_success()?;
    for name in ["s1", "s2", "s3", "s4", "s5"] {
        assert!(result.contains_stdout(name), "missing {} in:\n{}", name, result.stdout);
    }
    assert!(result.contains_stdout("not set"));

    // Without a policy nothing is pruned
    let result = wsnap!(world.root(), "-C", &dir, "prune").assert_success()?;
    assert!(result.contains_stdout("No local retention policy set"));

    wsnap!(world.root(), "-C", &dir, "set-retention", "fixed", "count=3").assert_success()?;
    let result = wsnap!(world.root(), "-C", &dir, "prune").assert_success()?;
    assert!(result.contains_stdout("Pruned 2 local snapshot(s)"));
    assert!(result.contains_stdout("s1") && result.contains_stdout("s2"));
    assert!(!result.contains_stdout("s3"));

    let result = wsnap!(world.root(), "-C", &dir, "list").assert_success()?;
    assert!(!result.contains_stdout("s1"));
    assert!(!result.contains_stdout("s2"));
    assert!(result.contains_stdout("fixed count=3"));

    let result = wsnap!(world.root(), "-C", &dir, "prune").assert_success()?;
    assert!(result.contains_stdout("Nothing to prune"));
    Ok(())
}

#[test]
fn test_malformed_policy_is_rejected() -> Result<()> {
    require_git!();
    let world = TestWorld::new()?;
    let dir = world.world_arg();
    init_with_snapshots(&world, &["s1"])?;

    let result = wsnap!(world.root(), "-C", &dir, "set-retention", "keep-last-abc").assert_failure()?;
    assert!(result.contains_stderr("invalid retention policy"));

    let result = wsnap!(world.root(), "-C", &dir, "list").assert_success()?;
    assert!(result.contains_stdout("not set"));
    Ok(())
}

#[test]
fn test_delete_snapshot() -> Result<()> {
    require_git!();
    let world = TestWorld::new()?;
    let dir = world.world_arg();
    init_with_snapshots(&world, &["s1", "s2"])?;

    wsnap!(world.root(), "-C", &dir, "delete", "s1").assert_success()?;
    let result = wsnap!(world.root(), "-C", &dir, "delete", "s1").assert_failure()?;
    assert!(result.contains_stderr("not found"));

    let result = wsnap!(world.root(), "-C", &dir, "list").assert_success()?;
    assert!(!result.contains_stdout("s1"));
    assert!(result.contains_stdout("s2"));
    Ok(())
}

#[test]
fn test_restore_into_new_directory() -> Result<()> {
    require_git!();
    let world = TestWorld::new()?;
    let dir = world.world_arg();
    let restores = world.restores().display().to_string();
    init_with_snapshots(&world, &["s1", "s2"])?;
    world.write_level("live")?;

    let result = wsnap!(world.root(), "-C", &dir, "restore", "s1", "--into", &restores).assert_success()?;
    assert!(result.contains_stdout("Restored into"));

    let restored = world.restores().join("myworld-s1");
    assert_eq!(fs::read_to_string(restored.join("level.dat"))?, "state at s1");
    assert_eq!(fs::read_to_string(restored.join("region").join("r.0.0.mca"))?, "chunks");
    assert!(!restored.join(".git").exists());
    assert_eq!(fs::read_to_string(world.world().join("level.dat"))?, "live");

    // Restoring again never overwrites the first copy
    wsnap!(world.root(), "-C", &dir, "restore", "s1", "--into", &restores).assert_success()?;
    assert!(world.restores().join("myworld-s1-2").is_dir());

    let result = wsnap!(world.root(), "-C", &dir, "restore", "nope", "--into", &restores).assert_failure()?;
    assert!(result.contains_stderr("not found"));
    Ok(())
}

#[test]
fn test_push_and_prune_remote() -> Result<()> {
    require_git!();
    let world = TestWorld::new()?;
    let dir = world.world_arg();
    let remote = world.root().join("remote.git");
    git::GitCommand::new("create bare remote")
        .args(["init", "--bare", "--quiet"])
        .arg(&remote)
        .run()?;

    let remote_arg = remote.display().to_string();
    wsnap!(world.root(), "-C", &dir, "init", "--remote", &remote_arg).assert_success()?;
    for name in ["s1", "s2", "s3"] {
        world.write_level(&format!("state at {}", name))?;
        wsnap!(world.root(), "-C", &dir, "snapshot", "--name", name).assert_success()?;
        wsnap!(world.root(), "-C", &dir, "push", name).assert_success()?;
    }

    let result = wsnap!(world.root(), "-C", &dir, "list", "--remote").assert_success()?;
    assert!(result.contains_stdout("s1") && result.contains_stdout("s3"));

    wsnap!(world.root(), "-C", &dir, "set-retention", "--remote", "fixed", "count=1").assert_success()?;
    let result = wsnap!(world.root(), "-C", &dir, "prune", "--remote").assert_success()?;
    assert!(result.contains_stdout("Pruned 2 remote snapshot(s)"));

    let result = wsnap!(world.root(), "-C", &dir, "list", "--remote").assert_success()?;
    assert!(!result.contains_stdout("s1"));
    assert!(result.contains_stdout("s3"));

    // The local history is untouched
    let result = wsnap!(world.root(), "-C", &dir, "list").assert_success()?;
    assert!(result.contains_stdout("s1"));

    let restores = world.restores().display().to_string();
    wsnap!(world.root(), "-C", &dir, "restore", "s3", "--from-remote", "--into", &restores).assert_success()?;
    assert_eq!(
        fs::read_to_string(world.restores().join("myworld-s3").join("level.dat"))?,
        "state at s3"
    );
    Ok(())
}
