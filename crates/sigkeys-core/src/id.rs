//! Self-describing identifiers for public keys.
//!
//! An ID is a bech32 string: a human-readable prefix naming the key type
//! followed by the encoded public key bytes.

use bech32::{Bech32, ByteIterExt, Fe32IterExt, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;
use crate::key::KeyType;

/// A bech32 key identifier, e.g. `kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077`.
///
/// Compared, hashed and ordered as its string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ID(String);

impl ID {
    /// Encode a payload under the given prefix.
    pub fn encode(hrp: &str, payload: &[u8]) -> Result<Self, EncodingError> {
        let hrp = Hrp::parse(hrp).map_err(|e| EncodingError::InvalidHrp(e.to_string()))?;
        let s = bech32::encode::<Bech32>(hrp, payload)
            .map_err(|e| EncodingError::Bech32(e.to_string()))?;
        Ok(Self(s))
    }

    /// ID for a public key under one of the crate's key prefixes.
    pub(crate) fn from_key_bytes(hrp: &'static str, bytes: &[u8; 32]) -> Self {
        let hrp = Hrp::parse_unchecked(hrp);
        Self(
            bytes
                .iter()
                .copied()
                .bytes_to_fes()
                .with_checksum::<Bech32>(&hrp)
                .chars()
                .collect(),
        )
    }

    /// Decode into (prefix, payload).
    pub fn decode(&self) -> Result<(String, Vec<u8>), EncodingError> {
        decode_str(&self.0)
    }

    /// Parse and validate an ID string.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        if s.is_empty() {
            return Err(EncodingError::EmptyId);
        }
        decode_str(s)?;
        Ok(Self(s.to_string()))
    }

    /// The human-readable prefix (everything before the last `1`).
    pub fn hrp(&self) -> &str {
        match self.0.rfind('1') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// The public key type this prefix names, if it is a known one.
    pub fn key_type(&self) -> Option<KeyType> {
        KeyType::from_public_hrp(self.hrp())
    }

    /// Key for a sequenced item owned by this ID, `{id}-{seq:015}`.
    ///
    /// Zero padding keeps lexicographic order equal to sequence order.
    pub fn with_seq(&self, seq: u64) -> String {
        format!("{}-{:015}", self.0, seq)
    }

    /// Get the string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn decode_str(s: &str) -> Result<(String, Vec<u8>), EncodingError> {
    let (hrp, data) = bech32::decode(s).map_err(|e| EncodingError::Bech32(e.to_string()))?;
    Ok((hrp.as_str().to_string(), data))
}

impl fmt::Debug for ID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID({})", self.0)
    }
}

impl fmt::Display for ID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ID {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ID {
    type Error = EncodingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ID> for String {
    fn from(id: ID) -> Self {
        id.0
    }
}

impl AsRef<str> for ID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
