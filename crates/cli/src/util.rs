//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use engine::{Notice, NoticeSink};
use git::GitRepo;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use snap_core::{Scope, SnapshotId};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Install the stderr log subscriber
///
/// Each `-v` raises the level one step above `info`; without flags the
/// configured level applies.
pub fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => Level::from_str(configured).unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Directory an explicit `-C` names, or the current directory
pub fn world_dir(world: Option<&Path>) -> Result<PathBuf> {
    match world {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Open the world repository named by `-C`, or the nearest one above cwd
pub fn open_world(world: Option<&Path>) -> Result<GitRepo> {
    let repo = match world {
        Some(dir) => GitRepo::open(dir),
        None => GitRepo::discover(&world_dir(None)?),
    };
    repo.context("Not a worldsnap world (run 'wsnap init' first)")
}

/// Run a blocking store operation off the async runtime, giving up after `timeout`
///
/// The operation keeps running in the background after a timeout; callers
/// exit instead of waiting for it.
pub async fn run_with_timeout<T, F>(what: &str, timeout: Duration, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> snap_core::Result<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(op);
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => {
            let result = joined.with_context(|| format!("{} panicked", what))?;
            result.with_context(|| format!("Failed to {}", what))
        }
        Err(_) => anyhow::bail!("Timed out after {}s trying to {}", timeout.as_secs(), what),
    }
}

/// Run a store operation for `scope`; remote operations are bounded by `timeout`
pub async fn run_scoped<T, F>(scope: Scope, what: &str, timeout: Duration, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> snap_core::Result<T> + Send + 'static,
{
    match scope {
        Scope::Local => op().with_context(|| format!("Failed to {}", what)),
        Scope::Remote => run_with_timeout(what, timeout, op).await,
    }
}

pub fn scope_of(remote: bool) -> Scope {
    if remote {
        Scope::Remote
    } else {
        Scope::Local
    }
}

/// Spinner shown while a long store operation runs
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        progress.set_style(style);
    }
    progress.set_message(message.into());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Renders engine notices on the terminal
#[derive(Clone, Default)]
pub struct ConsoleNotices {
    progress: Option<ProgressBar>,
}

impl ConsoleNotices {
    /// Print around `progress` so notices do not tear the spinner
    pub fn with_progress(progress: ProgressBar) -> Self {
        Self {
            progress: Some(progress),
        }
    }

    fn print(&self, line: String) {
        match &self.progress {
            Some(progress) => progress.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }
}

impl NoticeSink for ConsoleNotices {
    fn notice(&self, notice: Notice) {
        let line = match notice {
            Notice::RetentionPolicyNotSet(scope) => format!(
                "{} No {} retention policy set, keeping every snapshot",
                "Note:".yellow(),
                scope
            ),
            Notice::PruneStarted(scope) => format!("{}", format!("Pruning {} snapshots...", scope).dimmed()),
            Notice::RestoreComplete(path) => {
                format!("{} Restored into {}", "✓".green(), path.display().cyan())
            }
        };
        self.print(line);
    }
}

/// Format a timestamp as relative time ("2 hours ago")
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds < 604800 {
        format!("{} days ago", seconds / 86400)
    } else {
        format!("{} weeks ago", seconds / 604800)
    }
}

/// Print one snapshot as a listing line
pub fn display_snapshot(sid: &SnapshotId, now: DateTime<Utc>) {
    match sid.created_at() {
        Some(ts) => println!(
            "{}  {} {}",
            sid.name().yellow(),
            ts.format("%Y-%m-%d %H:%M:%S UTC"),
            format!("({})", format_relative_time(ts, now)).dimmed()
        ),
        None => println!("{}  {}", sid.name().yellow(), "(unknown time)".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    #[test]
    fn test_format_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 8, 20, 12, 0, 0).unwrap();

        assert_eq!(format_relative_time(now, now), "0 seconds ago");
        assert_eq!(format_relative_time(now - ChronoDuration::hours(1), now), "1 hours ago");
        assert_eq!(format_relative_time(now - ChronoDuration::days(2), now), "2 days ago");
        assert_eq!(format_relative_time(now - ChronoDuration::days(21), now), "3 weeks ago");
        assert_eq!(format_relative_time(now + ChronoDuration::minutes(5), now), "in the future");
    }

    #[test]
    fn test_scope_of() {
        assert_eq!(scope_of(true), Scope::Remote);
        assert_eq!(scope_of(false), Scope::Local);
    }

    #[tokio::test]
    async fn test_run_with_timeout() {
        let value = run_with_timeout("add", Duration::from_secs(5), || Ok(2 + 2)).await.unwrap();
        assert_eq!(value, 4);

        let err = run_with_timeout("sleep", Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Timed out"));

        let err = run_with_timeout::<(), _>("fail", Duration::from_secs(5), || {
            Err(snap_core::SnapshotError::NotFound("s1".to_string()))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to fail"));
    }
}
