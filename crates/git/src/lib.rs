//! Git-backed snapshot stores
//!
//! This crate provides:
//! - A thin runner around the `git` executable
//! - [`GitRepo`]: local snapshot branches, the remote replica and
//!   `git config` backed repository settings
//! - [`GitCheckout`]: restoring a branch from a local path or remote URI
//!
//! Everything shells out to `git`, which must be on `PATH` (or named by
//! `WORLDSNAP_GIT`).

pub mod checkout;
pub mod command;
pub mod repo;

pub use checkout::GitCheckout;
pub use command::{git_available, GitCommand, GitOutput};
pub use repo::GitRepo;
