//! The Keychain: unified API for keys, sigchains and user claims.
//!
//! The Keychain brings together key storage, sigchain persistence and user
//! verification behind one interface.

use std::sync::Arc;
use std::time::Duration;

use sigkeys_core::{
    EdX25519Key, Sigchain, Statement, User, X25519Key, ID, USER_TYPE,
};
use sigkeys_store::{DocumentStore, Keyring, Keystore, SigchainStore, SigchainStoreConfig};
use tracing::debug;

use crate::error::{KeychainError, Result};
use crate::users::{verify_user, Requestor, UserResult};

/// How many unrevoked user statements a sigchain may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserPolicy {
    /// At most one user statement per sigchain.
    #[default]
    Single,
    /// At most one user statement per service.
    OnePerService,
}

/// Configuration for the Keychain.
#[derive(Debug, Clone)]
pub struct KeychainConfig {
    /// Sigchain persistence configuration.
    pub store: SigchainStoreConfig,
    /// Upper bound on each user verification fetch.
    pub request_timeout: Duration,
    /// User statement policy.
    pub user_statement_policy: UserPolicy,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            store: SigchainStoreConfig::default(),
            request_timeout: Duration::from_secs(10),
            user_statement_policy: UserPolicy::default(),
        }
    }
}

/// The main Keychain struct.
///
/// Provides a unified API for:
/// - Generating and storing keys
/// - Appending and revoking sigchain statements
/// - Adding and verifying user claims
pub struct Keychain<K: Keyring, D: DocumentStore> {
    keystore: Keystore<K>,
    sigchains: Arc<SigchainStore<D>>,
    requestor: Arc<dyn Requestor>,
    config: KeychainConfig,
}

impl<K: Keyring, D: DocumentStore> Keychain<K, D> {
    /// Create a new keychain.
    pub fn new(keyring: K, docs: D, requestor: Arc<dyn Requestor>, config: KeychainConfig) -> Self {
        Self {
            keystore: Keystore::new(keyring),
            sigchains: Arc::new(SigchainStore::new(docs, config.store.clone())),
            requestor,
            config,
        }
    }

    pub fn keystore(&self) -> &Keystore<K> {
        &self.keystore
    }

    pub fn sigchains(&self) -> &SigchainStore<D> {
        &self.sigchains
    }

    pub fn config(&self) -> &KeychainConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate and store a new EdX25519 key.
    pub async fn generate_edx25519_key(&self) -> Result<EdX25519Key> {
        let key = EdX25519Key::generate();
        self.keystore.save_edx25519_key(&key).await?;
        debug!(kid = %key.id(), "generated edx25519 key");
        Ok(key)
    }

    /// Generate and store a new X25519 key.
    pub async fn generate_x25519_key(&self) -> Result<X25519Key> {
        let key = X25519Key::generate();
        self.keystore.save_x25519_key(&key).await?;
        debug!(kid = %key.id(), "generated x25519 key");
        Ok(key)
    }

    /// The stored signing key for a sigchain.
    pub async fn signing_key(&self, kid: &ID) -> Result<EdX25519Key> {
        self.keystore
            .edx25519_key(kid)
            .await?
            .ok_or_else(|| KeychainError::KeyNotFound(kid.clone()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sigchains
    // ─────────────────────────────────────────────────────────────────────────

    /// Load and verify a sigchain. `Ok(None)` if nothing is stored.
    pub async fn sigchain(&self, kid: &ID) -> Result<Option<Sigchain>> {
        Ok(self.sigchains.sigchain(kid).await?)
    }

    /// Sign and append a statement to the kid's sigchain.
    pub async fn add_statement(&self, kid: &ID, data: Vec<u8>, kind: &str) -> Result<Statement> {
        let key = self.signing_key(kid).await?;
        let ts = now_millis();
        self.sigchains
            .append(kid, |sc| -> Result<Statement> {
                Ok(sc.new_statement(data, &key, kind, ts)?)
            })
            .await
    }

    /// Revoke the statement at `seq`.
    pub async fn revoke(&self, kid: &ID, seq: u64) -> Result<Statement> {
        let key = self.signing_key(kid).await?;
        let ts = now_millis();
        self.sigchains
            .append(kid, |sc| -> Result<Statement> {
                Ok(sc.revoke_statement(seq, &key, ts)?)
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Claim a user on a service, appending the user statement.
    ///
    /// The caller publishes [`User::sign_message`] at `url` afterwards.
    pub async fn add_user(&self, kid: &ID, service: &str, name: &str, url: &str) -> Result<User> {
        let key = self.signing_key(kid).await?;
        let ts = now_millis();
        let policy = self.config.user_statement_policy;
        let st = self
            .sigchains
            .append(kid, |sc| -> Result<Statement> {
                let existing = sc.users()?;
                let taken = match policy {
                    UserPolicy::Single => !existing.is_empty(),
                    UserPolicy::OnePerService => existing.iter().any(|u| u.service == service),
                };
                if taken {
                    return Err(KeychainError::UserExists {
                        kid: kid.clone(),
                        service: service.to_string(),
                    });
                }
                let user = User::new(kid.clone(), service, name, url, sc.last_seq() + 1)?;
                Ok(sc.new_statement(user.to_json()?, &key, USER_TYPE, ts)?)
            })
            .await?;
        Ok(User::from_statement(&st)?)
    }

    /// Current user claims in the kid's sigchain.
    pub async fn users(&self, kid: &ID) -> Result<Vec<User>> {
        match self.sigchain(kid).await? {
            Some(sc) => Ok(sc.users()?),
            None => Ok(Vec::new()),
        }
    }

    /// Check every current user claim in the kid's sigchain.
    pub async fn verify_users(&self, kid: &ID) -> Result<Vec<UserResult>> {
        let Some(sc) = self.sigchain(kid).await? else {
            return Ok(Vec::new());
        };
        let mut results = Vec::new();
        for user in sc.users()? {
            let result = verify_user(
                self.requestor.as_ref(),
                &sc,
                &user,
                self.config.request_timeout,
                now_millis(),
            )
            .await;
            results.push(result);
        }
        Ok(results)
    }
}

/// Get current time in milliseconds since Unix epoch.
fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
