//! Error types for the store module.

use sigkeys_core::{KeyError, SigchainError, StatementError};
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// A missing key or sigchain is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure in the underlying keyring or document store, passed through
    /// as-is.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An item with the same ID but a different type is already stored.
    #[error("item {id} already exists with type {existing}")]
    AlreadyExists { id: String, existing: String },

    /// The stored item is not of the requested type.
    #[error("item {id} has type {got}, expected {expected}")]
    InvalidItemType {
        id: String,
        expected: &'static str,
        got: String,
    },

    /// Stored key bytes could not be decoded.
    #[error("invalid stored key: {0}")]
    Key(#[from] KeyError),

    /// A stored statement could not be parsed.
    #[error("invalid statement at {path}: {source}")]
    Statement {
        path: String,
        #[source]
        source: StatementError,
    },

    /// A statement is stored under a path that does not match it.
    #[error("statement {key} stored at {path}")]
    PathMismatch { path: String, key: String },

    /// A stored path is not a sigchain statement path.
    #[error("invalid sigchain path: {0}")]
    InvalidPath(String),

    /// A sigchain failed validation, on load or on append.
    #[error("sigchain error: {0}")]
    Sigchain(#[from] SigchainError),

    /// Another writer stored a different statement at the same position.
    #[error("conflict at {path}: a different statement is already stored")]
    Conflict { path: String },
}

impl StoreError {
    /// Wrap a backend failure.
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }

    /// Whether stored data failed an integrity check (tampering or
    /// corruption), as opposed to absence, conflicts or backend failures.
    pub fn is_integrity_failure(&self) -> bool {
        match self {
            StoreError::Key(_)
            | StoreError::Statement { .. }
            | StoreError::PathMismatch { .. }
            | StoreError::InvalidPath(_) => true,
            StoreError::Sigchain(e) => e.is_integrity_failure(),
            StoreError::Backend(_)
            | StoreError::AlreadyExists { .. }
            | StoreError::InvalidItemType { .. }
            | StoreError::Conflict { .. } => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
