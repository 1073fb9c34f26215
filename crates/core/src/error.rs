//! Error taxonomy for snapshot operations

use std::io;
use thiserror::Error;

/// Errors raised by snapshot identity, policy decoding and store access
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Branch does not follow the snapshot naming convention
    #[error("not a snapshot branch: '{0}'")]
    InvalidBranchName(String),

    /// Snapshot name cannot be embedded in a branch name
    #[error("invalid snapshot name '{name}': {reason}")]
    InvalidSnapshotName { name: String, reason: &'static str },

    /// Retention policy string is present but malformed
    #[error("invalid retention policy '{config}': {reason}")]
    PolicyDecode { config: String, reason: String },

    /// Snapshot does not resolve to an existing branch
    #[error("snapshot not found: {0}")]
    NotFound(String),

    /// Required repository configuration is missing or unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Local disk, git process or network failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    /// Wrap an I/O error with a description of what was being attempted
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build an I/O error from a failure message (e.g. git stderr)
    pub fn io_message(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            context: context.into(),
            source: io::Error::other(message.into()),
        }
    }

    pub fn policy_decode(config: &str, reason: impl Into<String>) -> Self {
        Self::PolicyDecode {
            config: config.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<io::Error> for SnapshotError {
    fn from(source: io::Error) -> Self {
        Self::io("I/O error", source)
    }
}
