//! Worldsnap CLI - wsnap command

use anyhow::Result;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use system_config::SystemConfig;

mod cmd;
mod system_config;
mod util;

/// Worldsnap - snapshot history and retention for game worlds
#[derive(Parser)]
#[command(name = "wsnap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// World directory (default: nearest repository above the current directory)
    #[arg(short = 'C', long, global = true)]
    world: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a world directory
    Init {
        /// URL of a remote replica to push snapshots to
        #[arg(long)]
        remote: Option<String>,

        /// Name to register the remote under
        #[arg(long, default_value = "origin")]
        remote_name: String,
    },
    /// Take a snapshot of the world as it is now
    Snapshot {
        /// Snapshot name (default: current UTC time)
        #[arg(long)]
        name: Option<String>,
    },
    /// List snapshots, oldest first
    List {
        /// List the remote replica instead of the local repository
        #[arg(long)]
        remote: bool,
    },
    /// Delete snapshots according to the retention policy
    Prune {
        /// Prune the remote replica instead of the local repository
        #[arg(long)]
        remote: bool,
    },
    /// Delete a single snapshot
    Delete {
        /// Snapshot name
        name: String,
        /// Delete from the remote replica instead of the local repository
        #[arg(long)]
        remote: bool,
    },
    /// Push a local snapshot to the remote replica
    Push {
        /// Snapshot name
        name: String,
    },
    /// Restore a snapshot into a new directory
    Restore {
        /// Snapshot name
        name: String,
        /// Restore from the remote replica
        #[arg(long)]
        from_remote: bool,
        /// Name used for the restored directory (default: world directory name)
        #[arg(long)]
        world_name: Option<String>,
        /// Directory to restore under (default: restore.restores_dir)
        #[arg(long)]
        into: Option<PathBuf>,
    },
    /// Set or clear a retention policy
    SetRetention {
        /// Set the remote replica's policy instead of the local one
        #[arg(long)]
        remote: bool,
        /// Policy, e.g. `fixed count=10`; empty clears it
        policy: Vec<String>,
    },
    /// Show the available retention policy types
    RetentionTypes,
    /// View or edit the system configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Print one configuration value
    Get {
        /// Key, e.g. remote.timeout_secs
        key: String,
    },
    /// Change one configuration value
    Set {
        key: String,
        value: String,
    },
    /// Show the config file location
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration file
    Example,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = system_config::load();
    let log_level = config
        .as_ref()
        .map(|c| c.log.level.as_str())
        .unwrap_or(system_config::DEFAULT_LOG_LEVEL);
    util::init_logging(cli.verbose, log_level);

    // Config commands stay usable when the config file itself is broken
    let result = match cli.command {
        Commands::Config(config_cmd) => run_config(config_cmd).await,
        command => match config {
            Ok(config) => run(cli.world.as_deref(), command, &config).await,
            Err(e) => Err(e),
        },
    };

    // Exit here so a timed-out remote operation does not hold up runtime shutdown
    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

async fn run(world: Option<&Path>, command: Commands, config: &SystemConfig) -> Result<()> {
    match command {
        Commands::Init { remote, remote_name } => {
            cmd::init::run(world, remote.as_deref(), &remote_name).await
        }
        Commands::Snapshot { name } => cmd::snapshot::run(world, name.as_deref()).await,
        Commands::List { remote } => cmd::list::run(world, config, remote).await,
        Commands::Prune { remote } => cmd::prune::run(world, config, remote).await,
        Commands::Delete { name, remote } => cmd::delete::run(world, config, &name, remote).await,
        Commands::Push { name } => cmd::push::run(world, config, &name).await,
        Commands::Restore { name, from_remote, world_name, into } => {
            cmd::restore::run(world, config, &name, from_remote, world_name, into).await
        }
        Commands::SetRetention { remote, policy } => {
            cmd::retention::run_set(world, remote, &policy.join(" ")).await
        }
        Commands::RetentionTypes => cmd::retention::run_types().await,
        Commands::Config(config_cmd) => run_config(config_cmd).await,
    }
}

async fn run_config(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::List => cmd::config::run_list().await,
        ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
        ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
        ConfigCommands::Path { create } => cmd::config::run_path(create).await,
        ConfigCommands::Example => cmd::config::run_example().await,
    }
}
