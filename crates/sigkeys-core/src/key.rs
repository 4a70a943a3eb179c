//! The closed set of key kinds and a sum type over them.

use zeroize::Zeroizing;

use crate::edx25519::{EdX25519Key, EdX25519PublicKey, EDX25519_HRP};
use crate::error::KeyError;
use crate::id::ID;
use crate::x25519::{X25519Key, X25519PublicKey, X25519_HRP};

/// Key kinds. The item type strings are stable storage tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// EdX25519 private (signing) key.
    EdX25519,
    /// EdX25519 public key.
    EdX25519Public,
    /// X25519 private (encryption) key.
    X25519,
    /// X25519 public key.
    X25519Public,
}

impl KeyType {
    /// All key types.
    pub const ALL: [KeyType; 4] = [
        KeyType::EdX25519,
        KeyType::EdX25519Public,
        KeyType::X25519,
        KeyType::X25519Public,
    ];

    /// Storage tag for this key type.
    pub fn item_type(self) -> &'static str {
        match self {
            KeyType::EdX25519 => "edx25519",
            KeyType::EdX25519Public => "edx25519-public",
            KeyType::X25519 => "x25519",
            KeyType::X25519Public => "x25519-public",
        }
    }

    /// Parse a storage tag.
    pub fn from_item_type(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.item_type() == s)
    }

    /// The public key type identified by an ID prefix.
    pub fn from_public_hrp(hrp: &str) -> Option<Self> {
        match hrp {
            EDX25519_HRP => Some(KeyType::EdX25519Public),
            X25519_HRP => Some(KeyType::X25519Public),
            _ => None,
        }
    }

    /// Check if this is a private key type.
    pub fn is_private(self) -> bool {
        matches!(self, KeyType::EdX25519 | KeyType::X25519)
    }
}

/// Any key kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    EdX25519(EdX25519Key),
    EdX25519Public(EdX25519PublicKey),
    X25519(X25519Key),
    X25519Public(X25519PublicKey),
}

impl Key {
    /// The key ID. Private keys share the ID of their public key.
    pub fn id(&self) -> &ID {
        match self {
            Key::EdX25519(k) => k.id(),
            Key::EdX25519Public(k) => k.id(),
            Key::X25519(k) => k.id(),
            Key::X25519Public(k) => k.id(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Key::EdX25519(_) => KeyType::EdX25519,
            Key::EdX25519Public(_) => KeyType::EdX25519Public,
            Key::X25519(_) => KeyType::X25519,
            Key::X25519Public(_) => KeyType::X25519Public,
        }
    }

    pub fn is_private(&self) -> bool {
        self.key_type().is_private()
    }

    /// The public half of this key.
    pub fn public(&self) -> Key {
        match self {
            Key::EdX25519(k) => Key::EdX25519Public(k.public_key().clone()),
            Key::X25519(k) => Key::X25519Public(k.public_key().clone()),
            other => other.clone(),
        }
    }

    /// Raw key bytes as stored: 64-byte private key for EdX25519, 32 bytes
    /// otherwise.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            Key::EdX25519(k) => Zeroizing::new(k.private_key().to_vec()),
            Key::EdX25519Public(k) => Zeroizing::new(k.to_bytes().to_vec()),
            Key::X25519(k) => Zeroizing::new(k.private_key().to_vec()),
            Key::X25519Public(k) => Zeroizing::new(k.to_bytes().to_vec()),
        }
    }

    /// Decode raw key bytes of the given type.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(match key_type {
            KeyType::EdX25519 => Key::EdX25519(EdX25519Key::from_private_key(bytes)?),
            KeyType::EdX25519Public => {
                Key::EdX25519Public(EdX25519PublicKey::from_slice(bytes)?)
            }
            KeyType::X25519 => Key::X25519(X25519Key::from_private_key(bytes)?),
            KeyType::X25519Public => Key::X25519Public(X25519PublicKey::from_slice(bytes)?),
        })
    }
}

impl From<EdX25519Key> for Key {
    fn from(k: EdX25519Key) -> Self {
        Key::EdX25519(k)
    }
}

impl From<EdX25519PublicKey> for Key {
    fn from(k: EdX25519PublicKey) -> Self {
        Key::EdX25519Public(k)
    }
}

impl From<X25519Key> for Key {
    fn from(k: X25519Key) -> Self {
        Key::X25519(k)
    }
}

impl From<X25519PublicKey> for Key {
    fn from(k: X25519PublicKey) -> Self {
        Key::X25519Public(k)
    }
}
