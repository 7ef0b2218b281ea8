//! Key capabilities and the concrete keys DIMP content embeds.
//!
//! Content never depends on a particular algorithm: it consumes the
//! [`EncryptKey`], [`DecryptKey`], [`SignKey`] and [`VerifyKey`] capabilities.
//! The concrete keys here wrap Ed25519 signing, X25519 sealing and
//! ChaCha20-Poly1305 symmetric encryption.
//!
//! Private and symmetric keys have no `PartialEq`. Two such keys are the same
//! key when they round-trip a probe; see [`crate::matching`].

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde_json::Value;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{CoreError, Result};
use crate::record::{self, keys, Record};
use crate::transportable;

/// Something that can encrypt.
pub trait EncryptKey {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
}

/// Something that can decrypt what the matching [`EncryptKey`] produced.
pub trait DecryptKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Something that can sign.
pub trait SignKey {
    fn sign(&self, data: &[u8]) -> Vec<u8>;
}

/// Something that can verify what the matching [`SignKey`] produced.
pub trait VerifyKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// A private signing key that can derive its public half.
pub trait PrivateKey: SignKey {
    type Public: VerifyKey;

    fn public_key(&self) -> Self::Public;
}

/// Nonce size for ChaCha20-Poly1305.
const NONCE_LEN: usize = 12;

/// Authentication tag size for ChaCha20-Poly1305.
const TAG_LEN: usize = 16;

// ─────────────────────────────────────────────────────────────────────────────
// Symmetric keys
// ─────────────────────────────────────────────────────────────────────────────

/// A 256-bit ChaCha20-Poly1305 key.
///
/// Ciphertexts are laid out as `nonce || sealed`, so a ciphertext is
/// self-contained and the key can serve as both encrypt and decrypt key.
#[derive(Clone)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Algorithm name carried in the key record.
    pub const ALGORITHM: &'static str = "ChaCha20-Poly1305";

    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Export as a wire key record.
    pub fn to_key_record(&self) -> KeyRecord {
        KeyRecord::new(Self::ALGORITHM, &self.0)
    }

    /// Import from a wire key record.
    pub fn from_key_record(key: &KeyRecord) -> Result<Self> {
        if !key.algorithm().eq_ignore_ascii_case(Self::ALGORITHM) {
            return Err(CoreError::UnsupportedAlgorithm(key.algorithm().to_string()));
        }
        let data = key.data()?;
        let bytes: [u8; 32] = data.as_ref().try_into().map_err(|_| {
            CoreError::CryptoError(format!(
                "invalid key length: expected 32, got {}",
                data.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(&self.0.into())
    }
}

impl EncryptKey for SymmetricKey {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CoreError::CryptoError(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }
}

impl DecryptKey for SymmetricKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CoreError::CryptoError("ciphertext too short".into()));
        }
        let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| CoreError::CryptoError(e.to_string()))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fingerprint = blake3::hash(&self.0);
        write!(f, "SymmetricKey({})", &fingerprint.to_hex()[..16])
    }
}

/// A key as it travels inside content: `{algorithm, data, ...}`.
///
/// This is the wire view only. Fields other than `algorithm` and `data` (key
/// IDs, creation times, IVs from other implementations) are preserved as-is.
#[derive(Clone, PartialEq)]
pub struct KeyRecord {
    algorithm: String,
    data: String,
    extra: Record,
}

impl KeyRecord {
    /// Build a record from raw key material.
    pub fn new(algorithm: impl Into<String>, data: &[u8]) -> Self {
        Self {
            algorithm: algorithm.into(),
            data: transportable::encode(data),
            extra: Record::new(),
        }
    }

    /// Parse from a wire map.
    pub fn from_record(map: &Record) -> Result<Self> {
        Ok(Self {
            algorithm: record::require_str(map, keys::ALGORITHM)?.to_string(),
            data: record::require_str(map, keys::DATA)?.to_string(),
            extra: record::extras(map, &[&[keys::ALGORITHM, keys::DATA]]),
        })
    }

    /// Encode as a wire map.
    pub fn to_record(&self) -> Record {
        let mut map = self.extra.clone();
        map.insert(keys::ALGORITHM.into(), Value::String(self.algorithm.clone()));
        map.insert(keys::DATA.into(), Value::String(self.data.clone()));
        map
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Decode the key material.
    pub fn data(&self) -> Result<bytes::Bytes> {
        transportable::decode(&self.data)
    }

    /// Extension fields carried alongside the key.
    pub fn extra(&self) -> &Record {
        &self.extra
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ed25519 signing keys
// ─────────────────────────────────────────────────────────────────────────────

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl VerifyKey for Ed25519PublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key.verify(data, &signature).is_ok()
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", &self.to_hex()[..16])
    }
}

/// An Ed25519 private key.
#[derive(Clone)]
pub struct Ed25519PrivateKey {
    signing_key: SigningKey,
}

impl Ed25519PrivateKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }
}

impl SignKey for Ed25519PrivateKey {
    fn sign(&self, data: &[u8]) -> Vec<u8> {
        self.signing_key.sign(data).to_bytes().to_vec()
    }
}

impl PrivateKey for Ed25519PrivateKey {
    type Public = Ed25519PublicKey;

    fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }
}

impl fmt::Debug for Ed25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PrivateKey({:?})", self.public_key())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// X25519 sealing keys
// ─────────────────────────────────────────────────────────────────────────────

/// Domain separation for sealed-box key derivation.
const SEAL_CONTEXT: &str = "dimp-core v0 x25519 sealed box";

/// Derive the ChaCha20 key for one sealed box.
fn seal_key(shared: &[u8; 32], ephemeral: &[u8; 32], recipient: &[u8; 32]) -> SymmetricKey {
    let mut hasher = blake3::Hasher::new_derive_key(SEAL_CONTEXT);
    hasher.update(shared);
    hasher.update(ephemeral);
    hasher.update(recipient);
    SymmetricKey(*hasher.finalize().as_bytes())
}

/// An X25519 public key used as an encrypt key.
///
/// Encryption performs an ephemeral key agreement; the output is
/// `ephemeral_public || nonce || sealed`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl EncryptKey for X25519PublicKey {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let ephemeral = EphemeralSecret::random_from_rng(rand::thread_rng());
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&PublicKey::from(self.0));

        let key = seal_key(shared.as_bytes(), ephemeral_public.as_bytes(), &self.0);
        let sealed = key.encrypt(plaintext)?;

        let mut out = Vec::with_capacity(32 + sealed.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&sealed);
        Ok(out)
    }
}

impl fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519Pub({})", &hex::encode(self.0)[..16])
    }
}

/// An X25519 static secret used as a decrypt key.
pub struct X25519PrivateKey(StaticSecret);

impl X25519PrivateKey {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(StaticSecret::from(bytes))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(*PublicKey::from(&self.0).as_bytes())
    }
}

impl DecryptKey for X25519PrivateKey {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < 32 {
            return Err(CoreError::CryptoError("ciphertext too short".into()));
        }
        let (ephemeral, sealed) = ciphertext.split_at(32);
        let mut ephemeral_bytes = [0u8; 32];
        ephemeral_bytes.copy_from_slice(ephemeral);

        let shared = self.0.diffie_hellman(&PublicKey::from(ephemeral_bytes));
        let recipient = self.public_key();
        let key = seal_key(shared.as_bytes(), &ephemeral_bytes, recipient.as_bytes());
        key.decrypt(sealed)
    }
}

impl fmt::Debug for X25519PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X25519PrivateKey({:?})", self.public_key())
    }
}
