//! EdX25519 keys: Ed25519 signing keys that also carry an ID and convert to
//! X25519 for key agreement.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use zeroize::Zeroizing;

use crate::crypto::{Signature, SIGNATURE_LENGTH};
use crate::error::{KeyError, VerifyError};
use crate::id::ID;
use crate::x25519::{X25519Key, X25519PublicKey};

/// ID prefix for EdX25519 keys.
pub const EDX25519_HRP: &str = "kex";

/// Length of an Ed25519 seed.
pub const SEED_LENGTH: usize = 32;

/// Length of an Ed25519 private key (seed || public key).
pub const PRIVATE_KEY_LENGTH: usize = 64;

/// Length of an Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// An EdX25519 public key.
///
/// Always a valid curve point: the decompressed Edwards point is kept so
/// conversion to X25519 cannot fail.
#[derive(Clone)]
pub struct EdX25519PublicKey {
    id: ID,
    verifying_key: VerifyingKey,
    point: EdwardsPoint,
    metadata: BTreeMap<String, String>,
}

impl EdX25519PublicKey {
    /// Create from raw public key bytes.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> Result<Self, KeyError> {
        let point = CompressedEdwardsY(*bytes)
            .decompress()
            .ok_or(KeyError::InvalidPoint)?;
        let verifying_key = VerifyingKey::from_bytes(bytes).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self {
            id: ID::from_key_bytes(EDX25519_HRP, bytes),
            verifying_key,
            point,
            metadata: BTreeMap::new(),
        })
    }

    /// Create from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                got: bytes.len(),
            })?;
        Self::from_bytes(&arr)
    }

    /// Decode the public key an ID names. The prefix must be `kex`.
    pub fn from_id(id: &ID) -> Result<Self, KeyError> {
        let (hrp, payload) = id.decode()?;
        if hrp != EDX25519_HRP {
            return Err(KeyError::InvalidKeyType {
                id: id.to_string(),
                expected: EDX25519_HRP,
            });
        }
        Self::from_slice(&payload)
    }

    pub fn id(&self) -> &ID {
        &self.id
    }

    /// Get raw bytes.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.verifying_key.to_bytes()
    }

    /// Free-form metadata carried alongside the key (not part of its identity).
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Verify a detached signature.
    pub fn verify_detached(&self, signature: &Signature, message: &[u8]) -> Result<(), VerifyError> {
        let sig = DalekSignature::from_bytes(&signature.0);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| VerifyError::VerifyFailed)
    }

    /// Verify a detached signature given as raw bytes.
    ///
    /// Anything other than exactly 64 bytes fails.
    pub fn verify_detached_bytes(&self, signature: &[u8], message: &[u8]) -> Result<(), VerifyError> {
        let sig = Signature::from_slice(signature).map_err(|_| VerifyError::VerifyFailed)?;
        self.verify_detached(&sig, message)
    }

    /// Verify an attached signature (`signature || message`), returning the
    /// message.
    pub fn verify(&self, signed: &[u8]) -> Result<Vec<u8>, VerifyError> {
        if signed.len() < SIGNATURE_LENGTH {
            return Err(VerifyError::VerifyFailed);
        }
        let (sig, message) = signed.split_at(SIGNATURE_LENGTH);
        self.verify_detached_bytes(sig, message)?;
        Ok(message.to_vec())
    }

    /// Convert to the X25519 public key on the birationally equivalent
    /// Montgomery curve, `u = (1 + y) / (1 - y) mod 2^255 - 19`.
    pub fn to_x25519(&self) -> X25519PublicKey {
        X25519PublicKey::from_bytes(self.point.to_montgomery().to_bytes())
    }
}

impl PartialEq for EdX25519PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.verifying_key == other.verifying_key
    }
}

impl Eq for EdX25519PublicKey {}

impl Hash for EdX25519PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EdX25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdX25519PublicKey({})", self.id)
    }
}

/// An EdX25519 private key.
///
/// The secret is zeroized on drop; exported secret material is wrapped in
/// [`Zeroizing`].
#[derive(Clone)]
pub struct EdX25519Key {
    signing_key: SigningKey,
    public: EdX25519PublicKey,
}

impl EdX25519Key {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_signing_key(SigningKey::generate(&mut rng))
    }

    /// Create from a 32-byte seed. The same seed always yields the same key.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Create from a 64-byte private key (seed || public key).
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: PRIVATE_KEY_LENGTH,
                got: bytes.len(),
            });
        }
        let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
        seed.copy_from_slice(&bytes[..SEED_LENGTH]);
        let key = Self::from_seed(&seed);
        if key.public.to_bytes()[..] != bytes[SEED_LENGTH..] {
            return Err(KeyError::PublicKeyMismatch);
        }
        Ok(key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let scalar = x25519_scalar(&signing_key.to_bytes());
        let public = EdX25519PublicKey {
            id: ID::from_key_bytes(EDX25519_HRP, signing_key.verifying_key().as_bytes()),
            verifying_key: signing_key.verifying_key(),
            point: EdwardsPoint::mul_base_clamped(*scalar),
            metadata: BTreeMap::new(),
        };
        Self { signing_key, public }
    }

    pub fn id(&self) -> &ID {
        &self.public.id
    }

    pub fn public_key(&self) -> &EdX25519PublicKey {
        &self.public
    }

    /// The 32-byte seed.
    pub fn seed(&self) -> Zeroizing<[u8; SEED_LENGTH]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// The 64-byte private key (seed || public key).
    pub fn private_key(&self) -> Zeroizing<[u8; PRIVATE_KEY_LENGTH]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Detached signature over a message.
    pub fn sign_detached(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Attached signature: `signature || message`.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig = self.sign_detached(message);
        let mut out = Vec::with_capacity(SIGNATURE_LENGTH + message.len());
        out.extend_from_slice(&sig.0);
        out.extend_from_slice(message);
        out
    }

    /// Convert to an X25519 key: the first 32 bytes of SHA-512(seed), as
    /// libsodium's `crypto_sign_ed25519_sk_to_curve25519` does. Clamping
    /// happens at scalar multiplication.
    pub fn to_x25519(&self) -> X25519Key {
        let scalar = x25519_scalar(&self.signing_key.to_bytes());
        X25519Key::from_seed(&scalar)
    }
}

fn x25519_scalar(seed: &[u8; SEED_LENGTH]) -> Zeroizing<[u8; 32]> {
    let digest = Sha512::digest(seed);
    let mut scalar = Zeroizing::new([0u8; 32]);
    scalar.copy_from_slice(&digest[..32]);
    scalar
}

impl PartialEq for EdX25519Key {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for EdX25519Key {}

impl fmt::Debug for EdX25519Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdX25519Key({})", self.public.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_SEED: [u8; 32] = [0x01; 32];
    const ALICE_ID: &str = "kex132yw8ht5p8cetl2jmvknewjawt9xwzdlrk2pyxlnwjyqrdq0dawqqph077";
    const ALICE_X25519_ID: &str = "kbx1rvd43h2sag2tvrdp0duse5p82nvhpjd6hpjwhv7q7vqklega8atshec5ws";

    #[test]
    fn test_seed_vector() {
        let key = EdX25519Key::from_seed(&ALICE_SEED);
        assert_eq!(key.id().as_str(), ALICE_ID);
        assert_eq!(
            hex::encode(key.public_key().to_bytes()),
            "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c"
        );
    }

    #[test]
    fn test_deterministic_from_seed() {
        let k1 = EdX25519Key::from_seed(&[0x42; 32]);
        let k2 = EdX25519Key::from_seed(&[0x42; 32]);
        assert_eq!(k1.public_key(), k2.public_key());
        assert_eq!(k1.id(), k2.id());
        assert_ne!(EdX25519Key::generate().id(), k1.id());
    }

    #[test]
    fn test_x25519_conversion_vector() {
        let key = EdX25519Key::from_seed(&ALICE_SEED);
        assert_eq!(key.to_x25519().id().as_str(), ALICE_X25519_ID);
        assert_eq!(key.public_key().to_x25519().id().as_str(), ALICE_X25519_ID);
        assert_eq!(
            hex::encode(key.public_key().to_x25519().to_bytes()),
            "1b1b58dd50ea14b60da17b790cd02754d970c9bab864ebb3c0f3016fe51d3f57"
        );
    }

    #[test]
    fn test_private_and_public_conversion_commute() {
        for _ in 0..16 {
            let key = EdX25519Key::generate();
            assert_eq!(
                key.to_x25519().public_key(),
                &key.public_key().to_x25519()
            );
        }
    }

    #[test]
    fn test_converted_keys_agree() {
        let alice = EdX25519Key::generate();
        let bob = EdX25519Key::generate();

        let ab = alice.to_x25519().shared_secret(&bob.public_key().to_x25519());
        let ba = bob.to_x25519().shared_secret(&alice.public_key().to_x25519());
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_sign_verify_detached() {
        let key = EdX25519Key::generate();
        let sig = key.sign_detached(b"hello world");
        key.public_key()
            .verify_detached(&sig, b"hello world")
            .expect("valid signature should verify");
        assert_eq!(
            key.public_key().verify_detached(&sig, b"hello worlD"),
            Err(VerifyError::VerifyFailed)
        );

        let other = EdX25519Key::generate();
        assert!(other.public_key().verify_detached(&sig, b"hello world").is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_signature_length() {
        let key = EdX25519Key::generate();
        let sig = key.sign_detached(b"msg");
        assert_eq!(
            key.public_key().verify_detached_bytes(&sig.0[..63], b"msg"),
            Err(VerifyError::VerifyFailed)
        );
        let mut long = sig.0.to_vec();
        long.push(0);
        assert!(key.public_key().verify_detached_bytes(&long, b"msg").is_err());
    }

    #[test]
    fn test_sign_verify_attached() {
        let key = EdX25519Key::generate();
        let signed = key.sign(b"attached");
        assert_eq!(signed.len(), 64 + 8);
        assert_eq!(key.public_key().verify(&signed).unwrap(), b"attached".to_vec());

        let mut tampered = signed.clone();
        *tampered.last_mut().unwrap() ^= 0x01;
        assert!(key.public_key().verify(&tampered).is_err());
        assert!(key.public_key().verify(&signed[..10]).is_err());
    }

    #[test]
    fn test_private_key_roundtrip() {
        let key = EdX25519Key::generate();
        let private = key.private_key();
        assert_eq!(&private[..32], &key.seed()[..]);
        assert_eq!(&private[32..], &key.public_key().to_bytes()[..]);

        let decoded = EdX25519Key::from_private_key(&private[..]).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_private_key_mismatch() {
        let key = EdX25519Key::generate();
        let mut private = key.private_key();
        private[40] ^= 0xff;
        assert_eq!(
            EdX25519Key::from_private_key(&private[..]),
            Err(KeyError::PublicKeyMismatch)
        );
        assert!(matches!(
            EdX25519Key::from_private_key(&[0u8; 32]),
            Err(KeyError::InvalidLength { expected: 64, got: 32 })
        ));
    }

    #[test]
    fn test_public_key_from_id() {
        let key = EdX25519Key::from_seed(&ALICE_SEED);
        let public = EdX25519PublicKey::from_id(key.id()).unwrap();
        assert_eq!(&public, key.public_key());

        let x25519_id = ID::parse(ALICE_X25519_ID).unwrap();
        assert!(matches!(
            EdX25519PublicKey::from_id(&x25519_id),
            Err(KeyError::InvalidKeyType { .. })
        ));
    }

    #[test]
    fn test_metadata_not_part_of_identity() {
        let key = EdX25519Key::from_seed(&ALICE_SEED);
        let tagged = key.public_key().clone().with_metadata("name", "alice");
        assert_eq!(tagged.metadata().get("name").map(String::as_str), Some("alice"));
        assert_eq!(&tagged, key.public_key());
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_attached_sign_verify(seed in any::<[u8; 32]>(), msg in prop::collection::vec(any::<u8>(), 0..256)) {
                let key = EdX25519Key::from_seed(&seed);
                let signed = key.sign(&msg);
                prop_assert_eq!(key.public_key().verify(&signed).unwrap(), msg);
            }

            #[test]
            fn test_private_key_round_trip(seed in any::<[u8; 32]>()) {
                let key = EdX25519Key::from_seed(&seed);
                let restored = EdX25519Key::from_private_key(&key.private_key()[..]).unwrap();
                prop_assert_eq!(restored.id(), key.id());
            }
        }
    }
}
