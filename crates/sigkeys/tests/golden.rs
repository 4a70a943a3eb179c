//! Golden test vectors for cross-implementation verification.
//!
//! Every implementation must produce identical:
//! - key IDs (bech32, `kex1`/`kbx1`)
//! - Ed25519 to X25519 conversion
//! - statement bytes (ordered JSON, deterministic Ed25519 signature)
//! - statement hashes (SHA-256 of the statement bytes)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sigkeys::store::{statement_path, MemoryDocumentStore, SigchainStore, SigchainStoreConfig};
use sigkeys::{EdX25519Key, EdX25519PublicKey, Sigchain, Statement, StatementBuilder, X25519Key, ID};

const SEED: [u8; 32] = [0x01; 32];
const KID: &str = "kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077";
const KID_X25519: &str = "kbx1rvd43h2sag2tvrdp0duse5p82nvhpjd6hpjwhv7q7vqklega8atshec5ws";
const RAW_X25519: &str = "kbx15nsf9y4k28p83wth93tf7hafhvfajp45d2mge80ems45gz0c5gys57cytk";

/// One statement of the golden chain: seq, wire bytes, hash (hex).
struct Vector {
    seq: u64,
    json: &'static str,
    hash: &'static str,
}

const CHAIN: [Vector; 3] = [
    Vector {
        seq: 1,
        json: r#"{".sig":"+H4VoHKAzH8e7Fn0LTtabx1MSpmnEY7xejxzMLr13Cfu1uvj4LKDKJ8AWLP38OU+HDSqO9JYkR+MtM/o7JvzAw==","data":"AQEBAQEBAQEBAQEBAQEBAQ==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","seq":1,"ts":1234567890001,"type":"test"}"#,
        hash: "57fe5e71ce9c151cec8bcde471aab26a18d7a96a7ec13c45c2924cae4f8c1d70",
    },
    Vector {
        seq: 2,
        json: r#"{".sig":"GPxZq5Yv/FMoMp1T4N2/uVtKBTyabLh6VOwT3FAwDB724d07qnVQySU3z7g9hnuZwqAn880DiixSXCRPf0WIAA==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","prev":"V/5ecc6cFRzsi83kcaqyahjXqWp+wTxFwpJMrk+MHXA=","revoke":1,"seq":2,"ts":1234567890002,"type":"revoke"}"#,
        hash: "0a9c5d074b13c8a0bc007b9743c39b36b2dab6d989d438e902ad5376cf210bb1",
    },
    Vector {
        seq: 3,
        json: r#"{".sig":"Q2flDlQ/WSUM2FsBsJ9MDpXBdpVmlnGw0BBu1p/bv1R0+tCsucI+AfCQfVBE1ryoAcA8Y6JU3dQceiRY+yY6Bg==","data":"AgICAgICAgICAgICAgICAg==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","prev":"CpxdB0sTyKC8AHuXQ8ObNrLattmJ1DjpAq1Tds8hC7E=","seq":3,"ts":1234567890003,"type":"test"}"#,
        hash: "ee9eb11f41f68bf9ce6f8053663ba79dd457ce0a1d31992df7b76a66e8be65e8",
    },
];

/// Build the golden chain from the seed.
fn build_chain() -> Sigchain {
    let key = EdX25519Key::from_seed(&SEED);
    let mut sc = Sigchain::new(key.id().clone());
    let st = sc
        .new_statement(vec![0x01; 16], &key, "test", 1234567890001)
        .unwrap();
    sc.add(st).unwrap();
    sc.revoke(1, &key, 1234567890002).unwrap();
    let st = sc
        .new_statement(vec![0x02; 16], &key, "test", 1234567890003)
        .unwrap();
    sc.add(st).unwrap();
    sc
}

#[test]
fn test_key_ids() {
    let key = EdX25519Key::from_seed(&SEED);
    assert_eq!(key.id().as_str(), KID);
    assert_eq!(key.to_x25519().id().as_str(), KID_X25519);
    assert_eq!(X25519Key::from_seed(&SEED).id().as_str(), RAW_X25519);
}

#[test]
fn test_public_conversion_matches_private() {
    let public = EdX25519PublicKey::from_id(&ID::parse(KID).unwrap()).unwrap();
    assert_eq!(public.to_x25519().id().as_str(), KID_X25519);
}

#[test]
fn test_chain_bytes_and_hashes() {
    let sc = build_chain();
    assert_eq!(sc.len(), CHAIN.len());
    for (st, v) in sc.statements().iter().zip(CHAIN.iter()) {
        assert_eq!(st.seq, v.seq);
        assert_eq!(String::from_utf8(st.bytes()).unwrap(), v.json, "seq {}", v.seq);
        assert_eq!(st.hash().to_hex(), v.hash, "seq {}", v.seq);
    }
}

#[test]
fn test_prev_links_hash() {
    for pair in CHAIN.windows(2) {
        let next = Statement::parse(pair[1].json.as_bytes()).unwrap();
        let prev = next.prev.expect("linked statement");
        assert_eq!(hex::encode(prev), pair[0].hash);
    }
}

#[test]
fn test_parse_and_replay() {
    let statements: Vec<Statement> = CHAIN
        .iter()
        .map(|v| Statement::parse(v.json.as_bytes()).unwrap())
        .collect();
    let mut sc = Sigchain::new(ID::parse(KID).unwrap());
    sc.add_all(statements).unwrap();

    assert!(sc.is_revoked(1));
    assert_eq!(sc.revoked_by(1).map(|st| st.seq), Some(2));
    assert!(sc.find_last("test").is_some_and(|st| st.seq == 3));
    assert_eq!(sc.find_all("test").len(), 1);
}

#[test]
fn test_statement_builder_matches_chain() {
    let key = EdX25519Key::from_seed(&SEED);
    let st = StatementBuilder::new(key.id().clone())
        .seq(1)
        .data(vec![0x01; 16])
        .kind("test")
        .timestamp(1234567890001)
        .sign(&key);
    assert_eq!(st.bytes(), CHAIN[0].json.as_bytes());

    let sig = STANDARD.encode(st.sig.as_ref().unwrap());
    assert!(CHAIN[0].json.contains(&sig));
}

#[tokio::test]
async fn test_store_layout() {
    let store = SigchainStore::new(MemoryDocumentStore::new(), SigchainStoreConfig::default());
    let sc = build_chain();
    store.save_sigchain(&sc).await.unwrap();

    let kid = ID::parse(KID).unwrap();
    assert_eq!(
        statement_path(&kid, 3),
        format!("sigchain/{KID}-000000000000003")
    );
    let loaded = store.sigchain(&kid).await.unwrap().unwrap();
    assert_eq!(loaded.statements(), sc.statements());
}
