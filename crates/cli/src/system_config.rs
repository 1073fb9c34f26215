//! System-wide configuration
//!
//! Stored as TOML at `<config dir>/worldsnap/config.toml`; `WORLDSNAP_CONFIG`
//! points at a different file. A missing file means all defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "WORLDSNAP_CONFIG";

pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 120;

const MIN_REMOTE_TIMEOUT_SECS: u64 = 1;
const MAX_REMOTE_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub restore: RestoreConfig,
    pub remote: RemoteConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Where restored worlds are created; unset means the data directory
    pub restores_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Upper bound on any single remote operation
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level used when no `-v` flag is given
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_REMOTE_TIMEOUT_SECS..=MAX_REMOTE_TIMEOUT_SECS).contains(&self.remote.timeout_secs) {
            anyhow::bail!(
                "remote.timeout_secs must be between {} and {} (got {})",
                MIN_REMOTE_TIMEOUT_SECS,
                MAX_REMOTE_TIMEOUT_SECS,
                self.remote.timeout_secs
            );
        }

        tracing::Level::from_str(&self.log.level).map_err(|_| {
            anyhow::anyhow!(
                "log.level must be one of trace, debug, info, warn, error (got '{}')",
                self.log.level
            )
        })?;

        if let Some(dir) = &self.restore.restores_dir {
            if dir.as_os_str().is_empty() {
                anyhow::bail!("restore.restores_dir must not be empty");
            }
        }

        Ok(())
    }

    /// Configured restores directory, or `<data dir>/worldsnap/restores`
    pub fn restores_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.restore.restores_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("worldsnap").join("restores"))
            .context("Could not determine a restores directory; set restore.restores_dir")
    }
}

/// Path of the config file, if one can be determined
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("worldsnap").join("config.toml"))
}

/// Load the config file, falling back to defaults when it does not exist
pub fn load() -> Result<SystemConfig> {
    let path = match config_file_path() {
        Some(path) if path.exists() => path,
        _ => return Ok(SystemConfig::default()),
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write a default config file unless one exists
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save(&SystemConfig::default())?;
    }
    Ok(path)
}

pub fn example_config() -> &'static str {
    r#"# Worldsnap system configuration

[restore]
# Restored worlds are created under this directory
# restores_dir = "/home/me/worlds/restores"

[remote]
# Give up on a push, listing or delete after this many seconds (1-3600)
timeout_secs = 120

[log]
# trace, debug, info, warn or error; -v flags override this
level = "warn"
"#
}
