//! Error types for sigkeys core.
//!
//! The families follow how callers are expected to react: encoding errors
//! mean corrupt input, verification errors mean an untrustworthy statement,
//! and sigchain errors mean the chain as a whole must not be trusted.

use thiserror::Error;

use crate::id::ID;

/// Malformed bech32, base64 or JSON input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("bech32 error: {0}")]
    Bech32(String),

    #[error("invalid human-readable prefix: {0}")]
    InvalidHrp(String),

    #[error("empty id")]
    EmptyId,

    #[error("base64 error in {field}: {reason}")]
    Base64 { field: &'static str, reason: String },

    #[error("json error: {0}")]
    Json(String),

    #[error("not enough bytes for statement: {0}")]
    TooShort(usize),

    #[error("malformed statement: {0}")]
    MalformedStatement(String),
}

/// Errors constructing or decoding keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid key type for {id}: expected prefix {expected}")]
    InvalidKeyType { id: String, expected: &'static str },

    #[error("public key is not a valid curve point")]
    InvalidPoint,

    #[error("public key does not match private key")]
    PublicKeyMismatch,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("verify failed")]
    VerifyFailed,

    #[error("statement is not signed")]
    MissingSignature,

    #[error("invalid signature length: {0}")]
    InvalidSignatureLength(usize),

    #[error("statement bytes don't match specific serialization")]
    SpecificSerializationMismatch,

    #[error("invalid signer key: {0}")]
    Key(#[from] KeyError),
}

/// Errors parsing a statement from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Sigchain sequencing, linkage and revocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigchainError {
    #[error("invalid sigchain kid: expected {expected}, got {got}")]
    InvalidKid { expected: ID, got: ID },

    #[error("no data")]
    EmptyData,

    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("invalid statement sequence: expected {expected}, got {got}")]
    InvalidSequence { expected: u64, got: u64 },

    #[error("invalid statement previous: root statement has a previous hash")]
    UnexpectedPrev,

    #[error("invalid statement previous hash at seq {seq}")]
    PrevHashMismatch { seq: u64 },

    #[error("invalid revoke {revoke} in statement {seq}")]
    InvalidRevoke { seq: u64, revoke: u64 },

    #[error("revoke targets a revoke statement at seq {0}")]
    RevokingARevoke(u64),

    #[error("statement at seq {0} is already revoked")]
    AlreadyRevoked(u64),

    #[error("invalid revoke seq {0}")]
    InvalidRevokeSeq(u64),

    #[error("invalid sigchain key {got} for sigchain {expected}")]
    InvalidSigchainKey { expected: ID, got: ID },
}

impl SigchainError {
    /// Whether the error means the chain (or a statement offered for it)
    /// failed an integrity check, as opposed to a caller mistake in
    /// constructing a new statement.
    pub fn is_integrity_failure(&self) -> bool {
        !matches!(
            self,
            SigchainError::InvalidSigchainKey { .. } | SigchainError::InvalidRevokeSeq(_)
        )
    }
}

/// Errors building or validating a user claim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("user kid mismatch: expected {expected}, got {got}")]
    KidMismatch { expected: ID, got: ID },

    #[error("user seq mismatch: expected {expected}, got {got}")]
    SeqMismatch { expected: u64, got: u64 },

    #[error("not a user statement: type {0:?}")]
    NotUserStatement(String),

    #[error("user message does not match: {0}")]
    MessageMismatch(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}
