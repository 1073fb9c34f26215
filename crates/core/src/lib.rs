//! Worldsnap Core - snapshot identity and store contracts
//!
//! This crate provides the foundational layer shared by every other crate:
//! - Snapshot identity (branch name encoding + total order)
//! - Per-store snapshot history
//! - Store, remote and configuration capability traits
//! - Error taxonomy
//! - In-memory stores for tests and dry runs

pub mod config;
pub mod error;
pub mod history;
pub mod memory;
pub mod snapshot_id;
pub mod store;

// Re-export main types for convenience
pub use config::ConfigKey;
pub use error::SnapshotError;
pub use history::{sort_world_snapshots, SnapshotHistory};
pub use snapshot_id::SnapshotId;
pub use store::{BranchRef, RemoteStore, Repo, RepoConfig, Scope, SnapshotStore, TreeCheckout};

/// Common result type used throughout worldsnap
pub type Result<T> = std::result::Result<T, SnapshotError>;
