//! Error types for the Keychain.

use sigkeys_core::{KeyError, SigchainError, UserError, ID};
use sigkeys_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Sigchain validation error.
    #[error("sigchain error: {0}")]
    Sigchain(#[from] SigchainError),

    /// User claim error.
    #[error("user error: {0}")]
    User(#[from] UserError),

    /// Key error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// No signing key is stored for the kid.
    #[error("key not found: {0}")]
    KeyNotFound(ID),

    /// The user statement policy forbids another claim.
    #[error("user already exists in sigchain {kid} for service {service}")]
    UserExists { kid: ID, service: String },
}

impl KeychainError {
    /// Whether the error means stored or fetched data failed an integrity
    /// check. UIs should warn about tampering for these, not absence.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            KeychainError::Store(e) => e.is_integrity_failure(),
            KeychainError::Sigchain(e) => e.is_integrity_failure(),
            _ => false,
        }
    }
}

/// Result type for Keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;
