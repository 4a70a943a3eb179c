//! # sigkeys store
//!
//! Storage adapters for sigkeys. Keys live in a [`Keyring`], sigchains in a
//! [`DocumentStore`]; both are async traits so the adapters stay
//! backend-agnostic.
//!
//! ## Key Types
//!
//! - [`Keystore`] - Typed key storage over a keyring
//! - [`SigchainStore`] - Sigchain persistence with full re-validation on load
//! - [`MemoryKeyring`] / [`MemoryDocumentStore`] - In-memory backends
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sigkeys_core::{EdX25519Key, Sigchain, Statement};
//! use sigkeys_store::{MemoryDocumentStore, SigchainStore, SigchainStoreConfig, StoreError};
//!
//! async fn example() {
//!     let store = SigchainStore::new(MemoryDocumentStore::new(), SigchainStoreConfig::default());
//!     let key = EdX25519Key::generate();
//!
//!     let st = store
//!         .append(key.id(), |sc| -> Result<Statement, StoreError> {
//!             Ok(sc.new_statement(b"hello".to_vec(), &key, "test", 0)?)
//!         })
//!         .await
//!         .unwrap();
//!     assert_eq!(st.seq, 1);
//!
//!     let sc: Sigchain = store.sigchain(key.id()).await.unwrap().unwrap();
//!     assert_eq!(sc.len(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Not found is not an error**: lookups return `Ok(None)`
//! - **Integrity failures are distinguishable**: see [`StoreError::is_integrity_failure`]
//! - **Concurrent appends**: serialized per kid in-process, and checked
//!   against the stored chain under [`AppendPolicy::ExpectedSeq`]

pub mod error;
pub mod keystore;
mod locks;
pub mod memory;
pub mod sigchains;
pub mod traits;

pub use error::{Result, StoreError};
pub use keystore::Keystore;
pub use memory::{MemoryDocumentStore, MemoryKeyring};
pub use sigchains::{statement_path, AppendPolicy, SigchainStore, SigchainStoreConfig, SIGCHAIN_COLLECTION};
pub use traits::{Document, DocumentStore, Item, Keyring};
