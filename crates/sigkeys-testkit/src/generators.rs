//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sigkeys_core::{
    EdX25519Key, Sha256Hash, Sigchain, Statement, StatementBuilder, X25519Key, REVOKE_TYPE,
};

/// Generate a random EdX25519 key.
pub fn edx25519_key() -> impl Strategy<Value = EdX25519Key> {
    any::<[u8; 32]>().prop_map(|seed| EdX25519Key::from_seed(&seed))
}

/// Generate a random X25519 key.
pub fn x25519_key() -> impl Strategy<Value = X25519Key> {
    any::<[u8; 32]>().prop_map(|seed| X25519Key::from_seed(&seed))
}

/// Generate a random Sha256Hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash::from)
}

/// Generate a valid sequence number (1-indexed).
pub fn seq() -> impl Strategy<Value = u64> {
    1u64..=u64::MAX
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate a statement type. Never `revoke`.
pub fn kind() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_filter("not a revoke", |k| k != REVOKE_TYPE)
}

/// Generate non-empty statement data of at most `max_len` bytes.
pub fn data(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Parameters for generating a statement.
#[derive(Debug, Clone)]
pub struct StatementParams {
    pub seed: [u8; 32],
    pub seq: u64,
    pub kind: String,
    pub timestamp: i64,
    pub data: Vec<u8>,
    pub nonce: Vec<u8>,
    pub prev: Option<Sha256Hash>,
}

impl Arbitrary for StatementParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(), // seed
            seq(),
            kind(),
            timestamp(),
            data(512),
            prop::collection::vec(any::<u8>(), 0..=24),
            prop::option::of(sha256_hash()),
        )
            .prop_map(|(seed, seq, kind, timestamp, data, nonce, prev)| StatementParams {
                seed,
                seq,
                kind,
                timestamp,
                data,
                nonce,
                prev,
            })
            .boxed()
    }
}

/// Generate a signed statement from parameters.
pub fn statement_from_params(params: &StatementParams) -> Statement {
    let key = EdX25519Key::from_seed(&params.seed);
    let mut builder = StatementBuilder::new(key.id().clone())
        .seq(params.seq)
        .kind(params.kind.clone())
        .timestamp(params.timestamp)
        .data(params.data.clone())
        .nonce(params.nonce.clone());

    if let Some(prev) = params.prev {
        builder = builder.prev(prev);
    }

    builder.sign(&key)
}

/// One step in building a sigchain.
#[derive(Debug, Clone)]
pub enum ChainOp {
    /// Append a statement with this data.
    Append(Vec<u8>),
    /// Revoke a statement, chosen by index into the unrevoked ones.
    Revoke(usize),
}

/// Generate a sequence of chain operations.
pub fn chain_ops(max_len: usize) -> impl Strategy<Value = Vec<ChainOp>> {
    let op = prop_oneof![
        3 => data(64).prop_map(ChainOp::Append),
        1 => any::<usize>().prop_map(ChainOp::Revoke),
    ];
    prop::collection::vec(op, 1..=max_len)
}

/// Apply chain operations with `key`. Revokes with no candidate are skipped.
pub fn build_sigchain(key: &EdX25519Key, ops: &[ChainOp]) -> Sigchain {
    let mut sc = Sigchain::new(key.id().clone());
    for (i, op) in ops.iter().enumerate() {
        let ts = 1_000 + i as i64;
        match op {
            ChainOp::Append(data) => {
                if let Ok(st) = sc.new_statement(data.clone(), key, "test", ts) {
                    let _ = sc.add(st);
                }
            }
            ChainOp::Revoke(pick) => {
                let candidates: Vec<u64> = sc
                    .statements()
                    .iter()
                    .filter(|st| !st.is_revoke() && !sc.is_revoked(st.seq))
                    .map(|st| st.seq)
                    .collect();
                if !candidates.is_empty() {
                    let _ = sc.revoke(candidates[pick % candidates.len()], key, ts);
                }
            }
        }
    }
    sc
}
