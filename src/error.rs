//! Error types for driving a transition group.
//!
//! Only misuse by the owning integration is an error. Misbehaving children
//! (missing hooks, duplicate or late completions, vanished handles) are
//! absorbed by the group itself.

use thiserror::Error;

/// Errors returned by [`TransitionGroup`](crate::TransitionGroup) lifecycle calls.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// The group received an update before its first commit.
    #[error("transition group is not mounted yet")]
    NotMounted,

    /// `did_mount` was called a second time.
    #[error("transition group is already mounted")]
    AlreadyMounted,

    /// The group was torn down and can no longer be driven.
    #[error("transition group has been unmounted")]
    Unmounted,
}
