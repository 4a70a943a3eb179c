//! # sigkeys
//!
//! Key management for EdX25519 and X25519 keys, with hash-linked sigchains
//! of signed statements and verifiable user claims.
//!
//! ## Overview
//!
//! - **Keys**: EdX25519 signing keys (`kex1...`) and X25519 key agreement
//!   keys (`kbx1...`). Every EdX25519 key converts to an X25519 key.
//! - **Statements**: Signed, canonically encoded JSON records.
//! - **Sigchains**: Append-only chains of statements from one key, each
//!   linked to the SHA-256 of its predecessor. Statements can be revoked.
//! - **Users**: Claims linking a key to an account on a service, proven by a
//!   signed message published at a URL.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sigkeys::store::{MemoryDocumentStore, MemoryKeyring};
//! use sigkeys::users::MemoryRequestor;
//! use sigkeys::{Keychain, KeychainConfig};
//!
//! async fn example() -> sigkeys::Result<()> {
//!     let keychain = Keychain::new(
//!         MemoryKeyring::new(),
//!         MemoryDocumentStore::new(),
//!         Arc::new(MemoryRequestor::new()),
//!         KeychainConfig::default(),
//!     );
//!
//!     let key = keychain.generate_edx25519_key().await?;
//!     let st = keychain
//!         .add_statement(key.id(), b"hello".to_vec(), "note")
//!         .await?;
//!     keychain.revoke(key.id(), st.seq).await?;
//!
//!     let user = keychain
//!         .add_user(key.id(), "github", "alice", "https://gist.github.com/alice/1")
//!         .await?;
//!     println!("publish this:\n{}", user.sign_message(&key)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sigkeys::core` - Keys, IDs, statements and sigchains
//! - `sigkeys::store` - Keyring and document store traits and adapters

pub mod error;
pub mod keychain;
pub mod users;

// Re-export component crates
pub use sigkeys_core as core;
pub use sigkeys_store as store;

// Re-export main types for convenience
pub use error::{KeychainError, Result};
pub use keychain::{Keychain, KeychainConfig, UserPolicy};
pub use users::{verify_user, MemoryRequestor, RequestError, Requestor, UserResult, UserStatus};

// Re-export commonly used core types
pub use sigkeys_core::{
    EdX25519Key, EdX25519PublicKey, Key, KeyType, Sha256Hash, Sigchain, Signature, Statement,
    StatementBuilder, User, X25519Key, X25519PublicKey, ID,
};
