//! Keystore: typed key storage over a [`Keyring`].
//!
//! Keys are stored as [`Item`]s with an exact type tag per key kind. A
//! private key and its public key share an ID, so saving one over the other
//! is refused rather than silently replacing it. Saves to the same ID are
//! serialized, including across clones of a keystore.

use std::sync::Arc;

use sigkeys_core::{
    EdX25519Key, EdX25519PublicKey, Key, KeyType, X25519Key, X25519PublicKey, ID,
};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::locks::KeyedLocks;
use crate::traits::{Item, Keyring};

/// Typed key storage.
pub struct Keystore<K: Keyring> {
    keyring: Arc<K>,
    /// Per-ID locks for check-then-write saves.
    locks: Arc<KeyedLocks<String>>,
}

impl<K: Keyring> Clone for Keystore<K> {
    fn clone(&self) -> Self {
        Self {
            keyring: Arc::clone(&self.keyring),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<K: Keyring> Keystore<K> {
    pub fn new(keyring: K) -> Self {
        Self {
            keyring: Arc::new(keyring),
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// The underlying keyring.
    pub fn keyring(&self) -> &K {
        &self.keyring
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Save
    // ─────────────────────────────────────────────────────────────────────────

    /// Save a key.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if an item of a different
    /// type is stored under the same ID. Saving the same kind again
    /// replaces it.
    pub async fn save(&self, key: &Key) -> Result<()> {
        let id = key.id().to_string();
        let item_type = key.key_type().item_type();
        let _guard = self.locks.lock(&id).await;

        if let Some(existing) = self.keyring.get(&id).await? {
            if existing.item_type != item_type {
                warn!(%id, existing = %existing.item_type, new = item_type, "refusing to replace key of a different type");
                return Err(StoreError::AlreadyExists {
                    id,
                    existing: existing.item_type,
                });
            }
        }

        debug!(%id, item_type, "saving key");
        self.keyring.set(Item::new(id, item_type, key.to_bytes())).await
    }

    pub async fn save_edx25519_key(&self, key: &EdX25519Key) -> Result<()> {
        self.save(&Key::from(key.clone())).await
    }

    pub async fn save_edx25519_public_key(&self, key: &EdX25519PublicKey) -> Result<()> {
        self.save(&Key::from(key.clone())).await
    }

    pub async fn save_x25519_key(&self, key: &X25519Key) -> Result<()> {
        self.save(&Key::from(key.clone())).await
    }

    pub async fn save_x25519_public_key(&self, key: &X25519PublicKey) -> Result<()> {
        self.save(&Key::from(key.clone())).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Load
    // ─────────────────────────────────────────────────────────────────────────

    /// Load any kind of key.
    pub async fn key(&self, id: &ID) -> Result<Option<Key>> {
        match self.keyring.get(id.as_str()).await? {
            Some(item) => Ok(Some(decode_item(&item)?)),
            None => Ok(None),
        }
    }

    /// Load an item, requiring its type tag before decoding it.
    async fn typed_key(&self, id: &ID, key_type: KeyType) -> Result<Option<Key>> {
        let Some(item) = self.keyring.get(id.as_str()).await? else {
            return Ok(None);
        };
        if item.item_type != key_type.item_type() {
            return Err(StoreError::InvalidItemType {
                id: item.id,
                expected: key_type.item_type(),
                got: item.item_type,
            });
        }
        Ok(Some(decode_item(&item)?))
    }

    pub async fn edx25519_key(&self, id: &ID) -> Result<Option<EdX25519Key>> {
        match self.typed_key(id, KeyType::EdX25519).await? {
            Some(Key::EdX25519(key)) => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    pub async fn x25519_key(&self, id: &ID) -> Result<Option<X25519Key>> {
        match self.typed_key(id, KeyType::X25519).await? {
            Some(Key::X25519(key)) => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    /// Load an EdX25519 public key, or the public half of a stored private
    /// key.
    pub async fn edx25519_public_key(&self, id: &ID) -> Result<Option<EdX25519PublicKey>> {
        match self.key(id).await? {
            Some(Key::EdX25519(key)) => Ok(Some(key.public_key().clone())),
            Some(Key::EdX25519Public(key)) => Ok(Some(key)),
            Some(other) => Err(StoreError::InvalidItemType {
                id: id.to_string(),
                expected: KeyType::EdX25519Public.item_type(),
                got: other.key_type().item_type().to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Load an X25519 public key, or the public half of a stored private
    /// key.
    pub async fn x25519_public_key(&self, id: &ID) -> Result<Option<X25519PublicKey>> {
        match self.key(id).await? {
            Some(Key::X25519(key)) => Ok(Some(key.public_key().clone())),
            Some(Key::X25519Public(key)) => Ok(Some(key)),
            Some(other) => Err(StoreError::InvalidItemType {
                id: id.to_string(),
                expected: KeyType::X25519Public.item_type(),
                got: other.key_type().item_type().to_string(),
            }),
            None => Ok(None),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // List / Delete
    // ─────────────────────────────────────────────────────────────────────────

    /// All stored keys, ordered by ID. Items with unknown type tags are
    /// skipped.
    pub async fn keys(&self) -> Result<Vec<Key>> {
        let tags: Vec<&str> = KeyType::ALL.iter().map(|t| t.item_type()).collect();
        self.list(&tags).await
    }

    pub async fn edx25519_keys(&self) -> Result<Vec<EdX25519Key>> {
        let keys = self.list(&[KeyType::EdX25519.item_type()]).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| match k {
                Key::EdX25519(k) => Some(k),
                _ => None,
            })
            .collect())
    }

    pub async fn x25519_keys(&self) -> Result<Vec<X25519Key>> {
        let keys = self.list(&[KeyType::X25519.item_type()]).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| match k {
                Key::X25519(k) => Some(k),
                _ => None,
            })
            .collect())
    }

    async fn list(&self, tags: &[&str]) -> Result<Vec<Key>> {
        let items = self.keyring.list(Some(tags)).await?;
        items.iter().map(decode_item).collect()
    }

    /// Delete a key. Returns whether it existed.
    pub async fn delete(&self, id: &ID) -> Result<bool> {
        let _guard = self.locks.lock(&id.to_string()).await;
        debug!(%id, "deleting key");
        self.keyring.delete(id.as_str()).await
    }
}

fn decode_item(item: &Item) -> Result<Key> {
    let key_type = KeyType::from_item_type(&item.item_type).ok_or_else(|| {
        StoreError::InvalidItemType {
            id: item.id.clone(),
            expected: "key",
            got: item.item_type.clone(),
        }
    })?;
    let key = Key::from_bytes(key_type, &item.data)?;
    if key.id().as_str() != item.id {
        return Err(StoreError::Key(sigkeys_core::KeyError::PublicKeyMismatch));
    }
    Ok(key)
}
