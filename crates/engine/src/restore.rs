//! Restoring snapshots into fresh directories
//!
//! A restore never writes to the live world. It claims a new directory under
//! the restores root, named after the world and the snapshot, and checks the
//! snapshot's tree out into it. The source may be the local repository or a
//! remote URI, so a world can be recovered from a replica without fetching
//! its full history first.

use crate::notice::{Notice, NoticeSink};
use snap_core::{Result, SnapshotError, SnapshotId, TreeCheckout};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Upper bound on `-N` suffixes tried when picking a restore directory
const MAX_RESTORE_SUFFIX: u32 = 10_000;

/// Materializes snapshots through a [`TreeCheckout`]
pub struct RestoreEngine<'a, C: ?Sized> {
    checkout: &'a C,
    notices: &'a dyn NoticeSink,
}

impl<'a, C: TreeCheckout + ?Sized> RestoreEngine<'a, C> {
    pub fn new(checkout: &'a C, notices: &'a dyn NoticeSink) -> Self {
        Self { checkout, notices }
    }

    /// Restore `sid` from `uri` into a new directory under `restores_dir`
    ///
    /// Returns the directory that was created. Fails with
    /// [`SnapshotError::NotFound`] before touching the disk if the snapshot
    /// does not exist at `uri`. If the checkout itself fails, the partially
    /// written directory is left behind for inspection.
    pub fn restore(
        &self,
        uri: &str,
        restores_dir: &Path,
        world_name: &str,
        sid: &SnapshotId,
    ) -> Result<PathBuf> {
        let branch_name = sid.branch_name();
        if !self.checkout.branch_exists(uri, &branch_name)? {
            return Err(SnapshotError::NotFound(format!("{} at {}", branch_name, uri)));
        }

        fs::create_dir_all(restores_dir).map_err(|e| {
            SnapshotError::io(
                format!("failed to create restores directory {}", restores_dir.display()),
                e,
            )
        })?;
        let target = claim_restore_dir(restores_dir, world_name, sid.name())?;
        info!(snapshot = %sid, uri, target = %target.display(), "Restoring snapshot");

        if let Err(e) = self.checkout.checkout(uri, &branch_name, &target) {
            warn!(
                target = %target.display(),
                error = %e,
                "Restore failed, leaving partial directory in place"
            );
            return Err(e);
        }

        self.notices.notice(Notice::RestoreComplete(target.clone()));
        Ok(target)
    }
}

/// Make a name safe to use as a single path component
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "world".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create and return `<restores_dir>/<world>-<snapshot>[-N]`
///
/// `create_dir` fails on existing paths, so an earlier restore is never reused.
fn claim_restore_dir(restores_dir: &Path, world_name: &str, snapshot_name: &str) -> Result<PathBuf> {
    let base = format!("{}-{}", sanitize_component(world_name), snapshot_name);

    for attempt in 1..=MAX_RESTORE_SUFFIX {
        let candidate = if attempt == 1 {
            restores_dir.join(&base)
        } else {
            restores_dir.join(format!("{}-{}", base, attempt))
        };

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(SnapshotError::io(
                    format!("failed to create restore directory {}", candidate.display()),
                    e,
                ))
            }
        }
    }

    Err(SnapshotError::io_message(
        format!("failed to create restore directory for {}", base),
        "too many existing restores",
    ))
}
