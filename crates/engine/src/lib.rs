//! Snapshot lifecycle engine
//!
//! This crate provides:
//! - Pruning local and remote snapshot histories by retention policy
//! - Deleting and listing individual snapshots
//! - Restoring a snapshot into a fresh directory
//! - User-facing notices emitted along the way
//!
//! The engine takes no locks. Callers must not run a prune concurrently with
//! snapshot creation on the same world.

pub mod notice;
pub mod prune;
pub mod restore;

// Re-exports
pub use notice::{Notice, NoticeSink, Quiet};
pub use prune::PruneEngine;
pub use restore::RestoreEngine;
