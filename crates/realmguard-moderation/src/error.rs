//! Error types for the moderation layer.

use realmguard_protocol::IdentityId;

/// Errors a [`Verifier`](crate::Verifier) can report.
///
/// None of these is ever fatal: the evaluator treats every variant as an
/// inconclusive check and fails open.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// The external service could not be reached or refused the request.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    /// No answer within the configured bound.
    #[error("verifier timed out for identity {0}")]
    Timeout(IdentityId),

    /// The service answered, but not in a shape we understand.
    #[error("invalid verifier response: {0}")]
    InvalidResponse(String),
}

/// Errors from admin operations on the moderation configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The caller is not listed in `admins`.
    #[error("{0} is not allowed to change the configuration")]
    PermissionDenied(String),

    /// The entry is already in the target list.
    #[error("{entry} is already in {list}")]
    AlreadyPresent { list: &'static str, entry: String },

    /// The entry is not in the target list.
    #[error("{entry} is not in {list}")]
    NotPresent { list: &'static str, entry: String },

    /// A threshold outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },

    /// A device name that doesn't name any known platform.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// An admin tried to remove themselves.
    #[error("admins cannot remove themselves")]
    SelfRemoval,
}
