//! Repository configuration keys

use crate::store::RepoConfig;
use crate::{Result, SnapshotError};
use std::fmt;
use uuid::Uuid;

/// Section all worldsnap keys live under
pub const CONFIG_SECTION: &str = "worldsnap";

/// Remote used when `worldsnap.remote-name` is unset
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Keys read from the repository configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    LocalRetentionPolicy,
    RemoteRetentionPolicy,
    RemoteName,
    WorldUuid,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::LocalRetentionPolicy,
        ConfigKey::RemoteRetentionPolicy,
        ConfigKey::RemoteName,
        ConfigKey::WorldUuid,
    ];

    /// Name within the `worldsnap` section
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::LocalRetentionPolicy => "local-retention-policy",
            ConfigKey::RemoteRetentionPolicy => "remote-retention-policy",
            ConfigKey::RemoteName => "remote-name",
            ConfigKey::WorldUuid => "world-uuid",
        }
    }

    /// Fully qualified key, e.g. `worldsnap.world-uuid`
    pub fn qualified(self) -> String {
        format!("{}.{}", CONFIG_SECTION, self.name())
    }

    /// Look up a key by its qualified or short name
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name
            .strip_prefix(CONFIG_SECTION)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        Self::ALL.into_iter().find(|key| key.name() == short)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// The world this repository snapshots
pub fn read_world_uuid<C: RepoConfig + ?Sized>(config: &C) -> Result<Uuid> {
    let raw = config
        .get_string(ConfigKey::WorldUuid)?
        .ok_or_else(|| SnapshotError::Config(format!("{} is not set", ConfigKey::WorldUuid)))?;
    Uuid::parse_str(raw.trim()).map_err(|e| {
        SnapshotError::Config(format!("{} is not a valid UUID ({}): {}", ConfigKey::WorldUuid, raw, e))
    })
}

/// Remote to push to and prune, defaulting to `origin`
pub fn read_remote_name<C: RepoConfig + ?Sized>(config: &C) -> Result<String> {
    Ok(config
        .get_string(ConfigKey::RemoteName)?
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_REMOTE_NAME.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepo;

    #[test]
    fn test_key_names() {
        assert_eq!(ConfigKey::LocalRetentionPolicy.qualified(), "worldsnap.local-retention-policy");
        assert_eq!(ConfigKey::from_name("worldsnap.remote-name"), Some(ConfigKey::RemoteName));
        assert_eq!(ConfigKey::from_name("world-uuid"), Some(ConfigKey::WorldUuid));
        assert_eq!(ConfigKey::from_name("worldsnap.nope"), None);
    }

    #[test]
    fn test_read_world_uuid() {
        let world = Uuid::new_v4();
        let repo = MemoryRepo::new(world);
        assert_eq!(read_world_uuid(&repo).unwrap(), world);

        repo.set_string(ConfigKey::WorldUuid, "garbage").unwrap();
        assert!(matches!(read_world_uuid(&repo), Err(SnapshotError::Config(_))));
    }

    #[test]
    fn test_remote_name_default() {
        let repo = MemoryRepo::new(Uuid::new_v4());
        assert_eq!(read_remote_name(&repo).unwrap(), "origin");
        repo.set_string(ConfigKey::RemoteName, "backup").unwrap();
        assert_eq!(read_remote_name(&repo).unwrap(), "backup");
    }
}
