//! Advisory messages for the user

use snap_core::Scope;
use std::path::PathBuf;

/// Something the caller may want to show the user
///
/// Notices are informational only; control flow is carried by return values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No retention policy is configured for this scope, nothing was pruned
    RetentionPolicyNotSet(Scope),
    /// Branch deletions are about to begin
    PruneStarted(Scope),
    /// A snapshot was restored into the given directory
    RestoreComplete(PathBuf),
}

/// Receiver of [`Notice`]s
pub trait NoticeSink {
    fn notice(&self, notice: Notice);
}

/// Discards every notice
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl NoticeSink for Quiet {
    fn notice(&self, _notice: Notice) {}
}

impl<F: Fn(Notice)> NoticeSink for F {
    fn notice(&self, notice: Notice) {
        self(notice)
    }
}
