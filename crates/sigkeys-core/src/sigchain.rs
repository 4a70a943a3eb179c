//! Sigchain: an append-only, hash-linked log of statements signed by one key.
//!
//! Every statement is validated on [`Sigchain::add`]; a chain held in memory
//! is always valid. A failed add leaves the chain unmodified.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::edx25519::EdX25519Key;
use crate::error::{SigchainError, UserError};
use crate::id::ID;
use crate::statement::{Statement, StatementBuilder, REVOKE_TYPE};
use crate::user::{User, USER_TYPE};

/// An append-only sequence of statements rooted at one EdX25519 key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sigchain {
    kid: ID,
    statements: Vec<Statement>,
    /// Revoked seq -> seq of the revoking statement.
    revokes: HashMap<u64, u64>,
}

impl Sigchain {
    /// Create an empty sigchain for a key.
    pub fn new(kid: ID) -> Self {
        Self {
            kid,
            statements: Vec::new(),
            revokes: HashMap::new(),
        }
    }

    pub fn kid(&self) -> &ID {
        &self.kid
    }

    /// Statements in chain order. `statements()[i].seq == i + 1`.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }

    /// Sequence number of the last statement, or 0 if empty.
    pub fn last_seq(&self) -> u64 {
        self.last().map(|st| st.seq).unwrap_or(0)
    }

    /// Statement at a sequence number.
    pub fn get(&self, seq: u64) -> Option<&Statement> {
        let idx = usize::try_from(seq.checked_sub(1)?).ok()?;
        self.statements.get(idx)
    }

    /// Validate and append a statement.
    pub fn add(&mut self, st: Statement) -> Result<(), SigchainError> {
        self.check(&st)?;
        if st.revoke != 0 {
            self.revokes.insert(st.revoke, st.seq);
        }
        self.statements.push(st);
        Ok(())
    }

    /// Add statements in order, stopping at the first failure.
    pub fn add_all(
        &mut self,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<(), SigchainError> {
        for st in statements {
            self.add(st)?;
        }
        Ok(())
    }

    fn check(&self, st: &Statement) -> Result<(), SigchainError> {
        if st.kid != self.kid {
            return Err(SigchainError::InvalidKid {
                expected: self.kid.clone(),
                got: st.kid.clone(),
            });
        }
        if st.data.is_empty() && !st.is_revoke() {
            return Err(SigchainError::EmptyData);
        }

        st.verify()?;

        match self.last() {
            None => {
                if st.seq != 1 {
                    return Err(SigchainError::InvalidSequence {
                        expected: 1,
                        got: st.seq,
                    });
                }
                if st.prev.is_some() {
                    return Err(SigchainError::UnexpectedPrev);
                }
            }
            Some(last) => {
                let expected = last.seq + 1;
                if st.seq != expected {
                    return Err(SigchainError::InvalidSequence {
                        expected,
                        got: st.seq,
                    });
                }
                if st.prev != Some(last.hash()) {
                    return Err(SigchainError::PrevHashMismatch { seq: st.seq });
                }
            }
        }

        // A revoke statement names exactly one earlier, non-revoke target.
        if st.is_revoke() != (st.revoke != 0) {
            return Err(SigchainError::InvalidRevoke {
                seq: st.seq,
                revoke: st.revoke,
            });
        }
        if st.revoke != 0 {
            if st.revoke >= st.seq {
                return Err(SigchainError::InvalidRevoke {
                    seq: st.seq,
                    revoke: st.revoke,
                });
            }
            if self.revokes.contains_key(&st.revoke) {
                return Err(SigchainError::AlreadyRevoked(st.revoke));
            }
            if self.get(st.revoke).is_some_and(Statement::is_revoke) {
                return Err(SigchainError::RevokingARevoke(st.revoke));
            }
        }

        Ok(())
    }

    /// Build and sign the next statement without adding it.
    pub fn new_statement(
        &self,
        data: impl Into<Bytes>,
        key: &EdX25519Key,
        kind: &str,
        timestamp: i64,
    ) -> Result<Statement, SigchainError> {
        self.build_next(key, timestamp)
            .map(|b| b.data(data).kind(kind).sign(key))
    }

    fn build_next(&self, key: &EdX25519Key, timestamp: i64) -> Result<StatementBuilder, SigchainError> {
        if key.id() != &self.kid {
            return Err(SigchainError::InvalidSigchainKey {
                expected: self.kid.clone(),
                got: key.id().clone(),
            });
        }
        let mut builder = StatementBuilder::new(self.kid.clone())
            .seq(self.last_seq() + 1)
            .timestamp(timestamp);
        if let Some(last) = self.last() {
            builder = builder.prev(last.hash());
        }
        Ok(builder)
    }

    /// Revoke the statement at `seq`, appending and returning the revoke
    /// statement.
    pub fn revoke(
        &mut self,
        seq: u64,
        key: &EdX25519Key,
        timestamp: i64,
    ) -> Result<Statement, SigchainError> {
        let st = self.revoke_statement(seq, key, timestamp)?;
        self.add(st.clone())?;
        Ok(st)
    }

    /// Build and sign the statement revoking `seq` without adding it.
    pub fn revoke_statement(
        &self,
        seq: u64,
        key: &EdX25519Key,
        timestamp: i64,
    ) -> Result<Statement, SigchainError> {
        if seq == 0 || seq > self.last_seq() {
            return Err(SigchainError::InvalidRevokeSeq(seq));
        }
        if self.is_revoked(seq) {
            return Err(SigchainError::AlreadyRevoked(seq));
        }
        if self.get(seq).is_some_and(Statement::is_revoke) {
            return Err(SigchainError::RevokingARevoke(seq));
        }
        Ok(self
            .build_next(key, timestamp)?
            .kind(REVOKE_TYPE)
            .revoke(seq)
            .sign(key))
    }

    pub fn is_revoked(&self, seq: u64) -> bool {
        self.revokes.contains_key(&seq)
    }

    /// The statement that revoked `seq`, if any.
    pub fn revoked_by(&self, seq: u64) -> Option<&Statement> {
        self.revokes.get(&seq).and_then(|by| self.get(*by))
    }

    /// The current statement of a type: the last one of that type, unless
    /// it has been revoked. An empty type matches the last statement.
    pub fn find_last(&self, kind: &str) -> Option<&Statement> {
        if kind.is_empty() {
            return self.last();
        }
        let st = self.statements.iter().rev().find(|st| st.kind == kind)?;
        if self.is_revoked(st.seq) {
            return None;
        }
        Some(st)
    }

    /// All unrevoked statements of a type, in chain order.
    pub fn find_all(&self, kind: &str) -> Vec<&Statement> {
        self.statements
            .iter()
            .filter(|st| st.kind == kind && !self.is_revoked(st.seq))
            .collect()
    }

    /// Current (unrevoked) user claims.
    pub fn users(&self) -> Result<Vec<User>, UserError> {
        self.find_all(USER_TYPE)
            .into_iter()
            .map(User::from_statement)
            .collect()
    }
}

impl fmt::Display for Sigchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sigchain({}, {} statements, {} revoked)",
            self.kid,
            self.statements.len(),
            self.revokes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Sha256Hash;
    use crate::error::VerifyError;

    const TS: i64 = 1234567890001;

    fn alice() -> EdX25519Key {
        EdX25519Key::from_seed(&[0x01; 32])
    }

    fn chain_with(key: &EdX25519Key, n: u64) -> Sigchain {
        let mut sc = Sigchain::new(key.id().clone());
        for i in 0..n {
            let st = sc
                .new_statement(vec![i as u8 + 1; 16], key, "test", TS + i as i64)
                .unwrap();
            sc.add(st).unwrap();
        }
        sc
    }

    #[test]
    fn test_three_statement_chain_vector() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());

        let st1 = sc.new_statement(vec![0x01; 16], &key, "test", TS).unwrap();
        sc.add(st1).unwrap();
        let st2 = sc.revoke(1, &key, TS + 1).unwrap();
        let st3 = sc.new_statement(vec![0x02; 16], &key, "test", TS + 2).unwrap();
        sc.add(st3.clone()).unwrap();

        assert_eq!(sc.len(), 3);
        assert_eq!(sc.last_seq(), 3);
        assert!(sc.is_revoked(1));
        assert!(!sc.is_revoked(3));
        assert_eq!(sc.find_last("test"), Some(&st3));
        assert_eq!(sc.revoked_by(1), Some(&st2));

        assert_eq!(
            st2.hash().to_hex(),
            "0a9c5d074b13c8a0bc007b9743c39b36b2dab6d989d438e902ad5376cf210bb1"
        );
        assert_eq!(
            st3.hash().to_hex(),
            "ee9eb11f41f68bf9ce6f8053663ba79dd457ce0a1d31992df7b76a66e8be65e8"
        );
    }

    #[test]
    fn test_empty_data_rejected() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());
        for kind in ["", "test", "user", "Revoke"] {
            let st = sc.new_statement(Bytes::new(), &key, kind, TS).unwrap();
            assert_eq!(sc.add(st), Err(SigchainError::EmptyData), "type {kind:?}");
        }
        assert!(sc.is_empty());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = alice();
        let other = EdX25519Key::from_seed(&[0x02; 32]);
        let mut sc = chain_with(&key, 1);

        let err = sc.new_statement(vec![1], &other, "test", TS).unwrap_err();
        assert_eq!(
            err,
            SigchainError::InvalidSigchainKey {
                expected: key.id().clone(),
                got: other.id().clone()
            }
        );
        assert!(!err.is_integrity_failure());
        assert!(matches!(
            sc.revoke(1, &other, TS),
            Err(SigchainError::InvalidSigchainKey { .. })
        ));
        assert_eq!(sc.len(), 1);
        assert!(!sc.is_revoked(1));
    }

    #[test]
    fn test_add_wrong_kid() {
        let key = alice();
        let other = EdX25519Key::from_seed(&[0x02; 32]);
        let mut sc = Sigchain::new(key.id().clone());
        let st = Sigchain::new(other.id().clone())
            .new_statement(vec![1], &other, "test", TS)
            .unwrap();
        assert!(matches!(sc.add(st), Err(SigchainError::InvalidKid { .. })));
    }

    #[test]
    fn test_add_bad_signature() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());
        let mut st = sc.new_statement(vec![1], &key, "test", TS).unwrap();
        st.data = Bytes::from_static(b"\x02");
        assert_eq!(sc.add(st), Err(SigchainError::Verify(VerifyError::VerifyFailed)));
        assert!(sc.is_empty());
    }

    #[test]
    fn test_monotonic_sequence() {
        let key = alice();
        let mut sc = chain_with(&key, 3);
        for (i, st) in sc.statements().iter().enumerate() {
            assert_eq!(st.seq, i as u64 + 1);
        }
        for pair in sc.statements().windows(2) {
            assert_eq!(pair[1].prev, Some(pair[0].hash()));
        }

        let prev = sc.last().unwrap().hash();
        for seq in [1, 3, 5] {
            let st = StatementBuilder::new(key.id().clone())
                .seq(seq)
                .prev(prev)
                .data(vec![1])
                .sign(&key);
            assert_eq!(
                sc.add(st),
                Err(SigchainError::InvalidSequence { expected: 4, got: seq })
            );
        }
        assert_eq!(sc.len(), 3);
    }

    #[test]
    fn test_root_with_prev_rejected() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());
        let st = StatementBuilder::new(key.id().clone())
            .seq(1)
            .prev(Sha256Hash::hash(b"nothing"))
            .data(vec![1])
            .sign(&key);
        assert_eq!(sc.add(st), Err(SigchainError::UnexpectedPrev));
    }

    #[test]
    fn test_prev_hash_mismatch() {
        let key = alice();
        let mut sc = chain_with(&key, 1);
        let wrong = StatementBuilder::new(key.id().clone())
            .seq(2)
            .prev(Sha256Hash::hash(b"wrong"))
            .data(vec![1])
            .sign(&key);
        assert_eq!(sc.add(wrong), Err(SigchainError::PrevHashMismatch { seq: 2 }));

        let missing = StatementBuilder::new(key.id().clone())
            .seq(2)
            .data(vec![1])
            .sign(&key);
        assert_eq!(sc.add(missing), Err(SigchainError::PrevHashMismatch { seq: 2 }));
    }

    #[test]
    fn test_revoke_invalid_seq() {
        let key = alice();
        let mut sc = chain_with(&key, 2);
        assert_eq!(sc.revoke(0, &key, TS), Err(SigchainError::InvalidRevokeSeq(0)));
        assert_eq!(sc.revoke(3, &key, TS), Err(SigchainError::InvalidRevokeSeq(3)));
        assert_eq!(sc.revoke(9, &key, TS), Err(SigchainError::InvalidRevokeSeq(9)));
        assert_eq!(sc.len(), 2);
    }

    #[test]
    fn test_revoke_twice() {
        let key = alice();
        let mut sc = chain_with(&key, 2);
        sc.revoke(1, &key, TS).unwrap();
        assert_eq!(sc.revoke(1, &key, TS), Err(SigchainError::AlreadyRevoked(1)));

        // Hand-built duplicate revoke goes through add.
        let dup = sc
            .build_next(&key, TS)
            .unwrap()
            .kind(REVOKE_TYPE)
            .revoke(1)
            .sign(&key);
        assert_eq!(sc.add(dup), Err(SigchainError::AlreadyRevoked(1)));
        assert_eq!(sc.len(), 3);
    }

    #[test]
    fn test_revoking_a_revoke() {
        let key = alice();
        let mut sc = chain_with(&key, 1);
        sc.revoke(1, &key, TS).unwrap();
        assert_eq!(sc.revoke(2, &key, TS), Err(SigchainError::RevokingARevoke(2)));
    }

    #[test]
    fn test_self_and_forward_revoke_rejected() {
        let key = alice();
        let mut sc = chain_with(&key, 1);
        for target in [2, 3] {
            let st = sc
                .build_next(&key, TS)
                .unwrap()
                .kind(REVOKE_TYPE)
                .revoke(target)
                .sign(&key);
            assert_eq!(
                sc.add(st),
                Err(SigchainError::InvalidRevoke { seq: 2, revoke: target })
            );
        }
    }

    #[test]
    fn test_revoke_type_and_target_agree() {
        let key = alice();
        let mut sc = chain_with(&key, 1);

        let untyped = sc
            .build_next(&key, TS)
            .unwrap()
            .data(vec![1])
            .kind("test")
            .revoke(1)
            .sign(&key);
        assert!(matches!(sc.add(untyped), Err(SigchainError::InvalidRevoke { .. })));

        let targetless = sc.build_next(&key, TS).unwrap().kind(REVOKE_TYPE).sign(&key);
        assert!(matches!(sc.add(targetless), Err(SigchainError::InvalidRevoke { .. })));
    }

    #[test]
    fn test_find_last_and_find_all() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());
        for (data, kind) in [(1u8, "a"), (2, "b"), (3, "a")] {
            let st = sc.new_statement(vec![data], &key, kind, TS).unwrap();
            sc.add(st).unwrap();
        }

        assert_eq!(sc.find_last("a").unwrap().seq, 3);
        assert_eq!(sc.find_last("b").unwrap().seq, 2);
        assert_eq!(sc.find_last("c"), None);
        assert_eq!(sc.find_last("").unwrap().seq, 3);
        assert_eq!(sc.find_all("a").len(), 2);

        sc.revoke(3, &key, TS).unwrap();
        // The latest "a" is revoked; an older one is not resurrected.
        assert_eq!(sc.find_last("a"), None);
        assert_eq!(sc.find_last("").unwrap().seq, 4);
        let all: Vec<u64> = sc.find_all("a").iter().map(|st| st.seq).collect();
        assert_eq!(all, vec![1]);
        assert_eq!(sc.find_all(REVOKE_TYPE).len(), 1);
    }

    #[test]
    fn test_add_all_replays_chain() {
        let key = alice();
        let mut sc = chain_with(&key, 3);
        sc.revoke(2, &key, TS).unwrap();

        let mut replay = Sigchain::new(key.id().clone());
        replay.add_all(sc.statements().to_vec()).unwrap();
        assert_eq!(replay, sc);

        let mut broken = sc.statements().to_vec();
        broken.remove(1);
        let mut replay = Sigchain::new(key.id().clone());
        assert!(replay.add_all(broken).is_err());
        assert_eq!(replay.len(), 1);
    }

    #[test]
    fn test_display() {
        let key = alice();
        let mut sc = chain_with(&key, 2);
        sc.revoke(1, &key, TS).unwrap();
        assert_eq!(
            sc.to_string(),
            format!("Sigchain({}, 3 statements, 1 revoked)", key.id())
        );
    }

    #[test]
    fn test_get() {
        let sc = chain_with(&alice(), 2);
        assert_eq!(sc.get(0), None);
        assert_eq!(sc.get(1).unwrap().seq, 1);
        assert_eq!(sc.get(2).unwrap().seq, 2);
        assert_eq!(sc.get(3), None);
    }
}
