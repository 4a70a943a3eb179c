//! SigchainStore: sigchain persistence over a [`DocumentStore`].
//!
//! Each statement is stored as its wire bytes at
//! `sigchain/{kid}-{seq:015}`. The zero-padded sequence makes path order
//! equal chain order, so a chain loads by iterating its prefix. Loading
//! replays every statement through [`Sigchain::add`], re-verifying all
//! signatures and links on every read.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sigkeys_core::{Sigchain, SigchainError, Statement, ID};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::locks::KeyedLocks;
use crate::traits::DocumentStore;

/// Collection holding sigchain statements.
pub const SIGCHAIN_COLLECTION: &str = "sigchain";

/// How concurrent writers to the same sigchain are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// Plain last-write-wins writes. Callers must serialize appends to the
    /// same kid themselves.
    Unchecked,
    /// Statements are written create-if-absent and an append must extend
    /// the stored predecessor; anything else is a [`StoreError::Conflict`].
    #[default]
    ExpectedSeq,
}

/// Configuration for the SigchainStore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigchainStoreConfig {
    pub append_policy: AppendPolicy,
}

/// Sigchain persistence.
pub struct SigchainStore<D: DocumentStore> {
    docs: Arc<D>,
    config: SigchainStoreConfig,
    /// Per-kid locks for read-modify-append.
    locks: KeyedLocks<ID>,
}

impl<D: DocumentStore> SigchainStore<D> {
    pub fn new(docs: D, config: SigchainStoreConfig) -> Self {
        Self {
            docs: Arc::new(docs),
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// The underlying document store.
    pub fn documents(&self) -> &D {
        &self.docs
    }

    pub fn config(&self) -> &SigchainStoreConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write
    // ─────────────────────────────────────────────────────────────────────────

    /// Save every statement of a sigchain.
    ///
    /// Under [`AppendPolicy::ExpectedSeq`] statements already stored
    /// identically are left alone, and a different stored statement at the
    /// same position is a conflict.
    pub async fn save_sigchain(&self, sc: &Sigchain) -> Result<()> {
        debug!(kid = %sc.kid(), len = sc.len(), "saving sigchain");
        for st in sc.statements() {
            self.write(st).await?;
        }
        Ok(())
    }

    /// Save one statement that extends the stored chain.
    ///
    /// Under [`AppendPolicy::ExpectedSeq`] the stored predecessor must be the
    /// statement `st.prev` links to.
    pub async fn add_statement(&self, st: &Statement) -> Result<()> {
        if self.config.append_policy == AppendPolicy::ExpectedSeq && st.seq > 1 {
            let prev_path = statement_path(&st.kid, st.seq - 1);
            let stored = self.docs.get(&prev_path).await?;
            let linked = stored.is_some_and(|raw| {
                Statement::parse(&raw).is_ok_and(|prev| Some(prev.hash()) == st.prev)
            });
            if !linked {
                warn!(path = %prev_path, seq = st.seq, "append does not extend stored sigchain");
                return Err(StoreError::Conflict { path: prev_path });
            }
        }
        self.write(st).await
    }

    async fn write(&self, st: &Statement) -> Result<()> {
        let path = statement_path(&st.kid, st.seq);
        let data = Bytes::from(st.bytes());
        match self.config.append_policy {
            AppendPolicy::Unchecked => self.docs.set(&path, data).await,
            AppendPolicy::ExpectedSeq => {
                if self.docs.create(&path, data.clone()).await? {
                    debug!(%path, "stored statement");
                    return Ok(());
                }
                match self.docs.get(&path).await? {
                    Some(existing) if existing == data => Ok(()),
                    _ => {
                        warn!(%path, "a different statement is already stored");
                        Err(StoreError::Conflict { path })
                    }
                }
            }
        }
    }

    /// Load, validate and extend a sigchain in one step, holding the kid's
    /// lock throughout.
    ///
    /// `build` sees the current chain (empty if none is stored) and returns
    /// the next statement. The statement is validated, stored and returned.
    /// Errors from `build` are returned unchanged.
    pub async fn append<F, E>(&self, kid: &ID, build: F) -> std::result::Result<Statement, E>
    where
        F: FnOnce(&Sigchain) -> std::result::Result<Statement, E> + Send,
        E: From<StoreError> + From<SigchainError>,
    {
        let _guard = self.locks.lock(kid).await;

        let mut sc = self
            .sigchain(kid)
            .await?
            .unwrap_or_else(|| Sigchain::new(kid.clone()));
        let st = build(&sc)?;
        sc.add(st.clone())?;
        self.add_statement(&st).await?;
        debug!(%kid, seq = st.seq, kind = %st.kind, "appended statement");
        Ok(st)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read
    // ─────────────────────────────────────────────────────────────────────────

    /// Load and fully validate a sigchain. `Ok(None)` if nothing is stored.
    ///
    /// Any invalid statement fails the whole load; no part of a chain that
    /// does not replay is returned.
    pub async fn sigchain(&self, kid: &ID) -> Result<Option<Sigchain>> {
        let docs = self
            .docs
            .documents(SIGCHAIN_COLLECTION, &statement_prefix(kid))
            .await?;
        if docs.is_empty() {
            return Ok(None);
        }

        let mut sc = Sigchain::new(kid.clone());
        for doc in docs {
            let st = Statement::parse(&doc.data).map_err(|source| {
                warn!(path = %doc.path, error = %source, "invalid statement in sigchain");
                StoreError::Statement {
                    path: doc.path.clone(),
                    source,
                }
            })?;
            let expected = statement_path(&st.kid, st.seq);
            if doc.path != expected {
                warn!(path = %doc.path, %expected, "statement stored at wrong path");
                return Err(StoreError::PathMismatch {
                    path: doc.path,
                    key: st.key(),
                });
            }
            if let Err(e) = sc.add(st) {
                warn!(%kid, path = %doc.path, error = %e, "sigchain failed to replay");
                return Err(e.into());
            }
        }

        debug!(%kid, len = sc.len(), "loaded sigchain");
        Ok(Some(sc))
    }

    pub async fn sigchain_exists(&self, kid: &ID) -> Result<bool> {
        Ok(self.docs.get(&statement_path(kid, 1)).await?.is_some())
    }

    /// Delete every stored statement of a sigchain. Returns whether any
    /// existed.
    pub async fn delete_sigchain(&self, kid: &ID) -> Result<bool> {
        let _guard = self.locks.lock(kid).await;

        let docs = self
            .docs
            .documents(SIGCHAIN_COLLECTION, &statement_prefix(kid))
            .await?;
        let mut deleted = false;
        for doc in &docs {
            deleted |= self.docs.delete(&doc.path).await?;
        }
        debug!(%kid, count = docs.len(), "deleted sigchain");
        Ok(deleted)
    }

    /// Kids of all stored sigchains, sorted.
    pub async fn kids(&self) -> Result<Vec<ID>> {
        let docs = self.docs.documents(SIGCHAIN_COLLECTION, "").await?;
        let mut kids = BTreeSet::new();
        for doc in docs {
            kids.insert(kid_from_path(&doc.path)?);
        }
        Ok(kids.into_iter().collect())
    }
}

/// Path of the statement at `seq` in `kid`'s sigchain.
pub fn statement_path(kid: &ID, seq: u64) -> String {
    format!("{SIGCHAIN_COLLECTION}/{}", kid.with_seq(seq))
}

fn statement_prefix(kid: &ID) -> String {
    format!("{kid}-")
}

fn kid_from_path(path: &str) -> Result<ID> {
    let invalid = || StoreError::InvalidPath(path.to_string());
    let name = path
        .strip_prefix(SIGCHAIN_COLLECTION)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;
    let (kid, seq) = name.rsplit_once('-').ok_or_else(invalid)?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    ID::parse(kid).map_err(|_| invalid())
}
