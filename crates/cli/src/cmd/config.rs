//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, SystemConfig};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

const KEYS: [&str; 3] = ["restore.restores_dir", "remote.timeout_secs", "log.level"];

fn get_value(config: &SystemConfig, key: &str) -> Result<String> {
    let value = match key {
        "restore.restores_dir" => config
            .restore
            .restores_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default(),
        "remote.timeout_secs" => config.remote.timeout_secs.to_string(),
        "log.level" => config.log.level.clone(),
        _ => anyhow::bail!("Unknown config key: {}. Available keys: {}", key, KEYS.join(", ")),
    };
    Ok(value)
}

fn set_value(config: &mut SystemConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "restore.restores_dir" => {
            // An empty value goes back to the default location
            config.restore.restores_dir = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "remote.timeout_secs" => {
            let val: u64 = value.parse().context("Invalid value: must be a positive integer")?;
            config.remote.timeout_secs = val;
        }
        "log.level" => {
            config.log.level = value.trim().to_lowercase();
        }
        _ => anyhow::bail!("Unknown config key: {}. Available keys: {}", key, KEYS.join(", ")),
    }
    Ok(())
}

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path().context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[restore]".yellow());
    match &config.restore.restores_dir {
        Some(dir) => println!("  {} = {}", "restores_dir".cyan(), dir.display()),
        None => println!(
            "  {} = {}",
            "restores_dir".cyan(),
            match config.restores_dir() {
                Ok(dir) => format!("(default: {})", dir.display()).dimmed().to_string(),
                Err(_) => "(unset)".dimmed().to_string(),
            }
        ),
    }

    println!("\n{}", "[remote]".yellow());
    println!(
        "  {} = {} {}",
        "timeout_secs".cyan(),
        config.remote.timeout_secs,
        format!("({}s)", config.remote.timeout_secs).dimmed()
    );

    println!("\n{}", "[log]".yellow());
    println!("  {} = {}", "level".cyan(), config.log.level);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  timeout_secs: 1-3600");
    println!("  level: trace, debug, info, warn, error");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    // A broken file is replaced rather than blocking the fix
    let mut config = system_config::load().unwrap_or_default();
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;
    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path().context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", system_config::example_config());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_readable_and_writable() {
        let mut config = SystemConfig::default();
        for key in KEYS {
            let current = get_value(&config, key).unwrap();
            set_value(&mut config, key, &current).unwrap();
        }
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn test_set_value() {
        let mut config = SystemConfig::default();
        set_value(&mut config, "remote.timeout_secs", "30").unwrap();
        set_value(&mut config, "log.level", " DEBUG ").unwrap();
        set_value(&mut config, "restore.restores_dir", "/srv/restores").unwrap();

        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.log.level, "debug");
        assert_eq!(get_value(&config, "restore.restores_dir").unwrap(), "/srv/restores");

        assert!(set_value(&mut config, "remote.timeout_secs", "soon").is_err());
        assert!(set_value(&mut config, "gc.retain_count", "1").is_err());
        assert!(get_value(&config, "nope").is_err());
    }
}
