//! Error types for the permission engine.

use thiserror::Error;

use crate::policy::DenyReason;

/// Errors that can occur while evaluating group permissions.
///
/// A denial is an ordinary outcome of [`crate::evaluate`]; it only becomes
/// an error when a caller asks for one with [`crate::Decision::into_result`].
#[derive(Debug, Error)]
pub enum PermsError {
    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(DenyReason),

    /// A role byte that does not decode to a base role and modifier.
    #[error("invalid member type: {0:#04x}")]
    InvalidMemberType(u8),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
