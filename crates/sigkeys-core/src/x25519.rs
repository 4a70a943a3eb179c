//! X25519 keys for Diffie-Hellman key agreement.

use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::KeyError;
use crate::id::ID;

/// ID prefix for X25519 keys.
pub const X25519_HRP: &str = "kbx";

/// Length of X25519 private and public keys.
pub const KEY_LENGTH: usize = 32;

/// An X25519 public key. Every 32-byte string is a valid u-coordinate.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct X25519PublicKey {
    id: ID,
    public: PublicKey,
}

impl X25519PublicKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self {
            id: ID::from_key_bytes(X25519_HRP, &bytes),
            public: PublicKey::from(bytes),
        }
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_LENGTH,
            got: bytes.len(),
        })?;
        Ok(Self::from_bytes(arr))
    }

    /// Decode the public key an ID names. The prefix must be `kbx`.
    pub fn from_id(id: &ID) -> Result<Self, KeyError> {
        let (hrp, payload) = id.decode()?;
        if hrp != X25519_HRP {
            return Err(KeyError::InvalidKeyType {
                id: id.to_string(),
                expected: X25519_HRP,
            });
        }
        Self::from_slice(&payload)
    }

    pub fn id(&self) -> &ID {
        &self.id
    }

    pub fn to_bytes(&self) -> [u8; KEY_LENGTH] {
        self.public.to_bytes()
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519PublicKey({})", self.id)
    }
}

/// An X25519 private key.
#[derive(Clone)]
pub struct X25519Key {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl X25519Key {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Create from 32 secret bytes. Clamping is applied when the scalar is
    /// used, so any bytes are accepted.
    pub fn from_seed(seed: &[u8; KEY_LENGTH]) -> Self {
        Self::from_secret(StaticSecret::from(*seed))
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let mut seed = Zeroizing::new([0u8; KEY_LENGTH]);
        seed.copy_from_slice(bytes);
        Ok(Self::from_seed(&seed))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = X25519PublicKey::from_bytes(PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    pub fn id(&self) -> &ID {
        &self.public.id
    }

    pub fn public_key(&self) -> &X25519PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> Zeroizing<[u8; KEY_LENGTH]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// Diffie-Hellman with a peer's public key.
    pub fn shared_secret(&self, peer: &X25519PublicKey) -> Zeroizing<[u8; KEY_LENGTH]> {
        Zeroizing::new(self.secret.diffie_hellman(&peer.public).to_bytes())
    }
}

impl PartialEq for X25519Key {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for X25519Key {}

impl fmt::Debug for X25519Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Key({})", self.public.id)
    }
}
