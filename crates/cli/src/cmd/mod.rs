//! CLI command implementations

pub mod config;
pub mod delete;
pub mod init;
pub mod list;
pub mod prune;
pub mod push;
pub mod restore;
pub mod retention;
pub mod snapshot;
