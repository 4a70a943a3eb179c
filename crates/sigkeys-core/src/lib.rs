//! # sigkeys core
//!
//! Pure primitives for sigkeys: key IDs, EdX25519/X25519 keys, statements
//! and sigchains.
//!
//! This crate contains no I/O, no storage, no networking and no logging. It
//! is pure computation over cryptographic data structures, returning typed
//! errors.
//!
//! ## Key Types
//!
//! - [`ID`] - bech32 key identifier (`kex1...` for EdX25519, `kbx1...` for X25519)
//! - [`EdX25519Key`] - Ed25519 signing key, convertible to [`X25519Key`]
//! - [`Statement`] - One signed entry in a sigchain
//! - [`Sigchain`] - Append-only, hash-linked log of statements
//! - [`User`] - A claim linking a key to a service account
//!
//! ## Serialization
//!
//! Statements have exactly one valid encoding. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod edx25519;
pub mod error;
pub mod id;
pub mod key;
pub mod sigchain;
pub mod statement;
pub mod user;
pub mod x25519;

pub use crypto::{Sha256Hash, Signature, SIGNATURE_LENGTH};
pub use edx25519::{EdX25519Key, EdX25519PublicKey, EDX25519_HRP};
pub use error::{EncodingError, KeyError, SigchainError, StatementError, UserError, VerifyError};
pub use id::ID;
pub use key::{Key, KeyType};
pub use sigchain::Sigchain;
pub use statement::{Statement, StatementBuilder, REVOKE_TYPE};
pub use user::{service_validator, ServiceValidator, User, USER_TYPE};
pub use x25519::{X25519Key, X25519PublicKey, X25519_HRP};
