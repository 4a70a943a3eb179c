//! Backend traits: the generic keyring and document store the adapters
//! consume.
//!
//! Implementations wrap platform keychains, databases or remote services.
//! In-memory versions are in [`crate::memory`].

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use zeroize::Zeroizing;

use crate::error::Result;

/// A keyring entry: raw bytes under an ID, tagged with a type.
#[derive(Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    /// Exact type tag, e.g. `"edx25519"`.
    pub item_type: String,
    /// Raw bytes. May be private key material.
    pub data: Zeroizing<Vec<u8>>,
}

impl Item {
    pub fn new(id: impl Into<String>, item_type: impl Into<String>, data: Zeroizing<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            item_type: item_type.into(),
            data,
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("item_type", &self.item_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Async key-value store of [`Item`]s.
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Get an item by ID.
    async fn get(&self, id: &str) -> Result<Option<Item>>;

    /// Store an item, replacing any item with the same ID.
    async fn set(&self, item: Item) -> Result<()>;

    /// List items, optionally only those with one of the given types.
    /// Ordered by ID.
    async fn list(&self, types: Option<&[&str]>) -> Result<Vec<Item>>;

    /// Delete an item. Returns whether it existed.
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full path, `{collection}/{name}`.
    pub path: String,
    pub data: Bytes,
}

/// Async store of documents addressed by path.
///
/// Paths are `{collection}/{name}`. Writes to a path are last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document.
    async fn set(&self, path: &str, data: Bytes) -> Result<()>;

    /// Write a document only if none exists at the path. Returns whether it
    /// was written.
    async fn create(&self, path: &str, data: Bytes) -> Result<bool>;

    /// Read a document.
    async fn get(&self, path: &str) -> Result<Option<Bytes>>;

    /// Delete a document. Returns whether it existed.
    async fn delete(&self, path: &str) -> Result<bool>;

    /// Documents in a collection whose name starts with `prefix`, ordered by
    /// path.
    async fn documents(&self, collection: &str, prefix: &str) -> Result<Vec<Document>>;
}
