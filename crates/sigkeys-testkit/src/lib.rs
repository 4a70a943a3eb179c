//! # sigkeys testkit
//!
//! Testing utilities for sigkeys.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known statements with expected bytes and hashes for cross-platform verification
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sigkeys_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, detail) in verify_all_vectors() {
//!     assert!(ok, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sigkeys_testkit::generators::{statement_from_params, StatementParams};
//!
//! proptest! {
//!     #[test]
//!     fn statement_bytes_are_deterministic(params: StatementParams) {
//!         let s1 = statement_from_params(&params);
//!         let s2 = statement_from_params(&params);
//!         prop_assert_eq!(s1.bytes(), s2.bytes());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sigkeys_testkit::fixtures::TestFixture;
//!
//! let mut fixture = TestFixture::new();
//! let st = fixture.append(b"hello", "note");
//! fixture.revoke(st.seq);
//! assert_eq!(fixture.sigchain.len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, TestFixture};
pub use generators::{statement_from_params, StatementParams};
pub use vectors::{chain_vectors, key_vectors, verify_all_vectors, ChainVector, KeyVector};
