//! Snapshot identity and branch name encoding
//!
//! Every snapshot lives on its own branch named
//! `snapshots/<world-uuid>/<snapshot-name>`. The encoding is reversible:
//! [`SnapshotId::parse`] of [`SnapshotId::branch_name`] always yields an equal id.

use crate::{Result, SnapshotError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// First path component of every snapshot branch
pub const BRANCH_PREFIX: &str = "snapshots";

/// Format of timestamp-derived snapshot names (UTC)
pub const NAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Identity of a single snapshot of one world
///
/// Equality and hashing only consider the world id and the name, so two ids
/// that encode to the same branch are equal. The creation time is carried for
/// ordering: it comes from the name when the name is a timestamp, otherwise
/// from the branch metadata reported by the store.
#[derive(Debug, Clone)]
pub struct SnapshotId {
    world_uuid: Uuid,
    name: String,
    created_at: Option<DateTime<Utc>>,
}

impl SnapshotId {
    /// Create an id for a named snapshot
    pub fn new(world_uuid: Uuid, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let created_at = timestamp_from_name(&name);
        Ok(Self {
            world_uuid,
            name,
            created_at,
        })
    }

    /// Create an id whose name is the canonical rendering of `timestamp`
    ///
    /// Sub-second precision is dropped so the name round-trips.
    pub fn at(world_uuid: Uuid, timestamp: DateTime<Utc>) -> Self {
        let name = timestamp.format(NAME_TIMESTAMP_FORMAT).to_string();
        let created_at = timestamp_from_name(&name);
        Self {
            world_uuid,
            name,
            created_at,
        }
    }

    /// Create an id for a snapshot taken now
    pub fn now(world_uuid: Uuid) -> Self {
        Self::at(world_uuid, Utc::now())
    }

    /// Decode a branch name
    ///
    /// Fails with [`SnapshotError::InvalidBranchName`] for anything that is not
    /// a snapshot branch. Callers listing a store are expected to skip those.
    pub fn parse(branch_name: &str) -> Result<Self> {
        let invalid = || SnapshotError::InvalidBranchName(branch_name.to_string());

        let rest = branch_name
            .strip_prefix(BRANCH_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (uuid_part, name) = rest.split_once('/').ok_or_else(invalid)?;

        let world_uuid = Uuid::parse_str(uuid_part).map_err(|_| invalid())?;
        // Only the canonical spelling decodes, otherwise two branches could
        // map to the same id.
        if world_uuid.hyphenated().to_string() != uuid_part {
            return Err(invalid());
        }

        validate_name(name).map_err(|_| invalid())?;

        Ok(Self {
            world_uuid,
            name: name.to_string(),
            created_at: timestamp_from_name(name),
        })
    }

    /// Encode as a branch name (inverse of [`SnapshotId::parse`])
    pub fn branch_name(&self) -> String {
        format!(
            "{}/{}/{}",
            BRANCH_PREFIX,
            self.world_uuid.hyphenated(),
            self.name
        )
    }

    /// Attach the creation time reported by the store
    ///
    /// Ignored when the name already carries a timestamp.
    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        if self.created_at.is_none() {
            self.created_at = created_at;
        }
        self
    }

    pub fn world_uuid(&self) -> Uuid {
        self.world_uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl PartialEq for SnapshotId {
    fn eq(&self, other: &Self) -> bool {
        self.world_uuid == other.world_uuid && self.name == other.name
    }
}

impl Eq for SnapshotId {}

impl Hash for SnapshotId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.world_uuid.hash(state);
        self.name.hash(state);
    }
}

/// Creation time first (unknown times sort oldest), then name, then world.
///
/// Ids of the same branch compare equal whatever times they carry, matching
/// `Eq`. Every store listing reports one time per branch, so within a
/// listing the order is total.
impl Ord for SnapshotId {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.world_uuid.cmp(&other.world_uuid))
    }
}

impl PartialOrd for SnapshotId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Check that a name can be used as the last component of a git branch
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains('/') {
        Some("name contains '/'")
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("name contains whitespace or control characters")
    } else if name.chars().any(|c| matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')) {
        Some("name contains a character git does not allow in refs")
    } else if name.contains("..") || name.contains("@{") {
        Some("name contains '..' or '@{'")
    } else if name.starts_with('-') || name.starts_with('.') {
        Some("name starts with '-' or '.'")
    } else if name.ends_with('.') || name.ends_with(".lock") {
        Some("name ends with '.' or '.lock'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SnapshotError::InvalidSnapshotName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn timestamp_from_name(name: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(name, NAME_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
