//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use sigkeys::{Keychain, KeychainConfig, MemoryRequestor};
use sigkeys_core::{EdX25519Key, Sigchain, Statement, User, ID, USER_TYPE};
use sigkeys_store::{MemoryDocumentStore, MemoryKeyring};

/// Timestamp of the first statement a fixture signs.
pub const BASE_TIMESTAMP: i64 = 1234567890001;

/// A test fixture with a signing key and its sigchain.
///
/// Timestamps advance by one millisecond per statement, so fixtures with
/// the same seed produce the same bytes.
pub struct TestFixture {
    pub key: EdX25519Key,
    pub sigchain: Sigchain,
    clock: i64,
}

impl TestFixture {
    /// Create a new test fixture with a random key.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create with a deterministic key from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let key = EdX25519Key::from_seed(&seed);
        Self {
            sigchain: Sigchain::new(key.id().clone()),
            key,
            clock: BASE_TIMESTAMP,
        }
    }

    pub fn kid(&self) -> &ID {
        self.key.id()
    }

    fn tick(&mut self) -> i64 {
        let ts = self.clock;
        self.clock += 1;
        ts
    }

    /// Sign the next statement without adding it.
    pub fn next_statement(&mut self, data: &[u8], kind: &str) -> Statement {
        let ts = self.tick();
        self.sigchain
            .new_statement(data.to_vec(), &self.key, kind, ts)
            .expect("fixture key owns the sigchain")
    }

    /// Sign and append a statement.
    pub fn append(&mut self, data: &[u8], kind: &str) -> Statement {
        let st = self.next_statement(data, kind);
        self.sigchain.add(st.clone()).expect("valid next statement");
        st
    }

    /// Revoke the statement at `seq`.
    pub fn revoke(&mut self, seq: u64) -> Statement {
        let ts = self.tick();
        self.sigchain
            .revoke(seq, &self.key, ts)
            .expect("revocable statement")
    }

    /// Append a user claim.
    pub fn add_user(&mut self, service: &str, name: &str, url: &str) -> User {
        let user = User::new(
            self.kid().clone(),
            service,
            name,
            url,
            self.sigchain.last_seq() + 1,
        )
        .expect("valid user claim");
        self.append(&user.to_json().expect("user json"), USER_TYPE);
        user
    }

    /// A keychain over memory backends holding this fixture's key and
    /// sigchain.
    pub async fn keychain(
        &self,
    ) -> (Keychain<MemoryKeyring, MemoryDocumentStore>, Arc<MemoryRequestor>) {
        let requestor = Arc::new(MemoryRequestor::new());
        let keychain = Keychain::new(
            MemoryKeyring::new(),
            MemoryDocumentStore::new(),
            requestor.clone(),
            KeychainConfig::default(),
        );
        keychain
            .keystore()
            .save_edx25519_key(&self.key)
            .await
            .expect("save key");
        keychain
            .sigchains()
            .save_sigchain(&self.sigchain)
            .await
            .expect("save sigchain");
        (keychain, requestor)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}
