//! In-memory implementations of the backend traits.
//!
//! Used in tests and as defaults. Same semantics as persistent backends but
//! nothing survives the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::{Document, DocumentStore, Item, Keyring};

/// In-memory keyring.
#[derive(Default)]
pub struct MemoryKeyring {
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryKeyring {
    /// Create a new empty keyring.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Keyring for MemoryKeyring {
    async fn get(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn set(&self, item: Item) -> Result<()> {
        self.items.write().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn list(&self, types: Option<&[&str]>) -> Result<Vec<Item>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| types.map_or(true, |t| t.iter().any(|ty| *ty == item.item_type)))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.items.write().await.remove(id).is_some())
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn set(&self, path: &str, data: Bytes) -> Result<()> {
        self.docs.write().await.insert(path.to_string(), data);
        Ok(())
    }

    async fn create(&self, path: &str, data: Bytes) -> Result<bool> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(path) {
            return Ok(false);
        }
        docs.insert(path.to_string(), data);
        Ok(true)
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        Ok(self.docs.write().await.remove(path).is_some())
    }

    async fn documents(&self, collection: &str, prefix: &str) -> Result<Vec<Document>> {
        let start = format!("{collection}/{prefix}");
        let docs = self.docs.read().await;
        Ok(docs
            .range(start.clone()..)
            .take_while(|(path, _)| path.starts_with(&start))
            .map(|(path, data)| Document {
                path: path.clone(),
                data: data.clone(),
            })
            .collect())
    }
}
