//! World directories for CLI tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small world directory inside its own temporary sandbox
///
/// Layout of the sandbox:
/// - `myworld/` - the live world
/// - `restores/` - where restores are written
pub struct TestWorld {
    temp: TempDir,
}

impl TestWorld {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let world = temp.path().join("myworld");
        fs::create_dir_all(world.join("region"))?;
        fs::write(world.join("level.dat"), "v0")?;
        fs::write(world.join("region").join("r.0.0.mca"), "chunks")?;
        Ok(Self { temp })
    }

    /// Sandbox root; commands run here
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn world(&self) -> PathBuf {
        self.temp.path().join("myworld")
    }

    pub fn world_arg(&self) -> String {
        self.world().display().to_string()
    }

    pub fn restores(&self) -> PathBuf {
        self.temp.path().join("restores")
    }

    pub fn write_level(&self, content: &str) -> Result<()> {
        fs::write(self.world().join("level.dat"), content)?;
        Ok(())
    }
}
