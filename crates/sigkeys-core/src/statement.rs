//! Statement: one signed entry in a sigchain.
//!
//! A statement is either a claim carrying `data`, or a revocation of an
//! earlier statement by sequence number. Once signed it is immutable.

use bytes::Bytes;

use crate::canonical::{bytes_to_sign, excise_signature, parse_statement, statement_bytes};
use crate::crypto::{Sha256Hash, Signature};
use crate::edx25519::{EdX25519Key, EdX25519PublicKey};
use crate::error::{StatementError, VerifyError};
use crate::id::ID;

/// Type of a revocation statement.
pub const REVOKE_TYPE: &str = "revoke";

/// A sigchain statement.
///
/// Zero values (empty buffers, `0`, `None`) mean the field is absent and is
/// omitted from the serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Detached signature over [`Statement::bytes_to_sign`].
    pub sig: Option<Signature>,

    /// Claim payload. Required unless this is a revoke.
    pub data: Bytes,

    /// Signer and sigchain owner.
    pub kid: ID,

    /// Sequence number within the sigchain (1-indexed).
    pub seq: u64,

    /// Hash of the previous statement's wire bytes (None for the root).
    pub prev: Option<Sha256Hash>,

    /// Sequence number this statement revokes, or 0.
    pub revoke: u64,

    /// Type tag, e.g. `"user"` or `"revoke"`.
    pub kind: String,

    /// Author-claimed time in Unix milliseconds, or 0.
    pub timestamp: i64,

    /// Optional nonce.
    pub nonce: Vec<u8>,
}

impl Statement {
    /// Parse a signed statement from wire bytes.
    ///
    /// Input that is not the specific serialization of the decoded statement
    /// is rejected.
    pub fn parse(raw: &[u8]) -> Result<Self, StatementError> {
        parse_statement(raw)
    }

    /// Wire bytes, including the signature.
    pub fn bytes(&self) -> Vec<u8> {
        statement_bytes(self)
    }

    /// The bytes the signature covers.
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        bytes_to_sign(self)
    }

    /// Verify the signature against the public key named by `kid`.
    pub fn verify(&self) -> Result<(), VerifyError> {
        let sig = self.sig.as_ref().ok_or(VerifyError::MissingSignature)?;
        let public = EdX25519PublicKey::from_id(&self.kid)?;
        public.verify_detached(sig, &self.bytes_to_sign())
    }

    /// Verify the signature, and that `raw` is exactly the specific
    /// serialization of this statement.
    pub fn verify_specific(&self, raw: &[u8]) -> Result<(), VerifyError> {
        self.verify()?;
        match excise_signature(raw) {
            Some(unsigned) if unsigned == self.bytes_to_sign() => Ok(()),
            _ => Err(VerifyError::SpecificSerializationMismatch),
        }
    }

    /// Hash linking the next statement to this one: SHA-256 of the signed
    /// wire bytes.
    pub fn hash(&self) -> Sha256Hash {
        Sha256Hash::hash(&self.bytes())
    }

    /// Storage key, `{kid}-{seq:015}`.
    pub fn key(&self) -> String {
        self.kid.with_seq(self.seq)
    }

    /// Location of the statement, `/{kid}/{seq}`.
    pub fn url(&self) -> String {
        format!("/{}/{}", self.kid, self.seq)
    }

    pub fn is_revoke(&self) -> bool {
        self.kind == REVOKE_TYPE
    }
}

/// Builder for creating statements.
pub struct StatementBuilder {
    kid: ID,
    seq: u64,
    data: Bytes,
    prev: Option<Sha256Hash>,
    revoke: u64,
    kind: String,
    timestamp: i64,
    nonce: Vec<u8>,
}

impl StatementBuilder {
    /// Start building a statement for a sigchain.
    pub fn new(kid: ID) -> Self {
        Self {
            kid,
            seq: 0,
            data: Bytes::new(),
            prev: None,
            revoke: 0,
            kind: String::new(),
            timestamp: 0,
            nonce: Vec::new(),
        }
    }

    pub fn seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    pub fn prev(mut self, prev: Sha256Hash) -> Self {
        self.prev = Some(prev);
        self
    }

    pub fn revoke(mut self, revoke: u64) -> Self {
        self.revoke = revoke;
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn nonce(mut self, nonce: impl Into<Vec<u8>>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Build without signing.
    pub fn build(self) -> Statement {
        Statement {
            sig: None,
            data: self.data,
            kid: self.kid,
            seq: self.seq,
            prev: self.prev,
            revoke: self.revoke,
            kind: self.kind,
            timestamp: self.timestamp,
            nonce: self.nonce,
        }
    }

    /// Build and sign.
    pub fn sign(self, key: &EdX25519Key) -> Statement {
        let mut st = self.build();
        st.sig = Some(key.sign_detached(&st.bytes_to_sign()));
        st
    }
}
