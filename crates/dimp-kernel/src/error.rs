//! Error types for the Kernel.

use dimp_core::{CoreError, Id};
use dimp_perms::PermsError;
use thiserror::Error;

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The record could not be decoded.
    #[error("decode error: {0}")]
    Core(#[from] CoreError),

    /// Permission error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// A signed document does not verify against its owner's key.
    #[error("signature mismatch for {0}")]
    SignatureMismatch(Id),

    /// No verification key is known for the signer.
    #[error("unknown signer: {0}")]
    UnknownSigner(Id),
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
