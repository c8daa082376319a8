//! Fork ID validation errors.

use thiserror::Error;

/// Reasons a remote fork id is rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ForkIdError {
    /// The remote node is on a past fork and announces the wrong next
    /// upgrade; it needs a software update.
    #[error("remote needs update")]
    RemoteStale,

    /// The local node is on an incompatible chain or is missing an upgrade
    /// the remote already announced as passed.
    #[error("local incompatible or needs update")]
    LocalIncompatibleOrStale,
}
