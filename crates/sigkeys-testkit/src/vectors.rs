//! Golden test vectors for deterministic verification.
//!
//! These vectors ensure that key IDs, conversion and statement encoding
//! produce identical results across all implementations.

use sigkeys_core::{EdX25519Key, Sigchain, X25519Key};

/// Expected IDs for keys derived from a seed.
#[derive(Debug, Clone)]
pub struct KeyVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed (EdX25519) or private key (X25519).
    pub seed: [u8; 32],
    /// Expected `kex1` ID, if the seed is used as an EdX25519 seed.
    pub edx25519_id: Option<&'static str>,
    /// Expected `kbx1` ID.
    pub x25519_id: &'static str,
}

/// One statement in a golden sigchain.
#[derive(Debug, Clone)]
pub struct ChainVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Data, or empty for a revoke.
    pub data: &'static [u8],
    /// Sequence number to revoke, or 0.
    pub revoke: u64,
    /// Timestamp.
    pub timestamp: i64,
    /// Expected wire bytes.
    pub expected_json: &'static str,
    /// Expected SHA-256 of the wire bytes (hex).
    pub expected_hash: &'static str,
}

/// Seed of the golden sigchain key.
pub const CHAIN_SEED: [u8; 32] = [0x01; 32];

/// Get the key vectors.
pub fn key_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "EdX25519 seed 0x01, converted to X25519",
            seed: [0x01; 32],
            edx25519_id: Some("kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077"),
            x25519_id: "kbx1rvd43h2sag2tvrdp0duse5p82nvhpjd6hpjwhv7q7vqklega8atshec5ws",
        },
        KeyVector {
            name: "X25519 private key 0x01",
            seed: [0x01; 32],
            edx25519_id: None,
            x25519_id: "kbx15nsf9y4k28p83wth93tf7hafhvfajp45d2mge80ems45gz0c5gys57cytk",
        },
    ]
}

/// Get the golden sigchain: root, revoke of the root, then a second
/// statement. Signed with [`CHAIN_SEED`].
pub fn chain_vectors() -> Vec<ChainVector> {
    vec![
        ChainVector {
            name: "root statement",
            data: &[0x01; 16],
            revoke: 0,
            timestamp: 1234567890001,
            expected_json: r#"{".sig":"+H4VoHKAzH8e7Fn0LTtabx1MSpmnEY7xejxzMLr13Cfu1uvj4LKDKJ8AWLP38OU+HDSqO9JYkR+MtM/o7JvzAw==","data":"AQEBAQEBAQEBAQEBAQEBAQ==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","seq":1,"ts":1234567890001,"type":"test"}"#,
            expected_hash: "57fe5e71ce9c151cec8bcde471aab26a18d7a96a7ec13c45c2924cae4f8c1d70",
        },
        ChainVector {
            name: "revoke of the root",
            data: &[],
            revoke: 1,
            timestamp: 1234567890002,
            expected_json: r#"{".sig":"GPxZq5Yv/FMoMp1T4N2/uVtKBTyabLh6VOwT3FAwDB724d07qnVQySU3z7g9hnuZwqAn880DiixSXCRPf0WIAA==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","prev":"V/5ecc6cFRzsi83kcaqyahjXqWp+wTxFwpJMrk+MHXA=","revoke":1,"seq":2,"ts":1234567890002,"type":"revoke"}"#,
            expected_hash: "0a9c5d074b13c8a0bc007b9743c39b36b2dab6d989d438e902ad5376cf210bb1",
        },
        ChainVector {
            name: "statement after a revoke",
            data: &[0x02; 16],
            revoke: 0,
            timestamp: 1234567890003,
            expected_json: r#"{".sig":"Q2flDlQ/WSUM2FsBsJ9MDpXBdpVmlnGw0BBu1p/bv1R0+tCsucI+AfCQfVBE1ryoAcA8Y6JU3dQceiRY+yY6Bg==","data":"AgICAgICAgICAgICAgICAg==","kid":"kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077","prev":"CpxdB0sTyKC8AHuXQ8ObNrLattmJ1DjpAq1Tds8hC7E=","seq":3,"ts":1234567890003,"type":"test"}"#,
            expected_hash: "ee9eb11f41f68bf9ce6f8053663ba79dd457ce0a1d31992df7b76a66e8be65e8",
        },
    ]
}

/// Build the golden sigchain from its vectors.
pub fn build_chain(vectors: &[ChainVector]) -> Sigchain {
    let key = EdX25519Key::from_seed(&CHAIN_SEED);
    let mut sc = Sigchain::new(key.id().clone());
    for v in vectors {
        let result = if v.revoke != 0 {
            sc.revoke(v.revoke, &key, v.timestamp).map(|_| ())
        } else {
            sc.new_statement(v.data, &key, "test", v.timestamp)
                .and_then(|st| sc.add(st))
        };
        if result.is_err() {
            break;
        }
    }
    sc
}

/// Verify all vectors. Returns `(name, passed, detail)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for v in key_vectors() {
        let (got, expected) = match v.edx25519_id {
            Some(edx_id) => {
                let key = EdX25519Key::from_seed(&v.seed);
                (
                    format!("{} {}", key.id(), key.to_x25519().id()),
                    format!("{} {}", edx_id, v.x25519_id),
                )
            }
            None => (
                X25519Key::from_seed(&v.seed).id().to_string(),
                v.x25519_id.to_string(),
            ),
        };
        results.push((v.name.to_string(), got == expected, format!("got {got}")));
    }

    let vectors = chain_vectors();
    let sc = build_chain(&vectors);
    for (i, v) in vectors.iter().enumerate() {
        let (passed, detail) = match sc.statements().get(i) {
            Some(st) => {
                let json = String::from_utf8_lossy(&st.bytes()).into_owned();
                let hash = st.hash().to_hex();
                (
                    json == v.expected_json && hash == v.expected_hash,
                    format!("hash {hash}"),
                )
            }
            None => (false, "statement not built".to_string()),
        };
        results.push((v.name.to_string(), passed, detail));
    }

    results
}
