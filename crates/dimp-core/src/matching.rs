//! Key equivalence by behaviour.
//!
//! Two keys are the same key when one undoes the other on a fixed probe.
//! Serialized key records are never compared: equivalent keys may carry
//! different incidental fields (key IDs, creation times, encodings).

use std::ptr;

use crate::crypto::{DecryptKey, EncryptKey, PrivateKey, SignKey, VerifyKey};

/// Fixed probe used by every matching check.
pub const PROBE_PAYLOAD: &[u8; 32] = b"dimp/key-matching/probe-payload!";

/// Check that `decrypt_key` opens what `encrypt_key` seals.
///
/// Any failure along the way (encrypt error, decrypt error, different output)
/// is a mismatch, never an error.
pub fn match_encrypt_key<E, D>(encrypt_key: &E, decrypt_key: &D) -> bool
where
    E: EncryptKey + ?Sized,
    D: DecryptKey + ?Sized,
{
    let Ok(ciphertext) = encrypt_key.encrypt(PROBE_PAYLOAD) else {
        return false;
    };
    match decrypt_key.decrypt(&ciphertext) {
        Ok(plaintext) => plaintext == PROBE_PAYLOAD,
        Err(_) => false,
    }
}

/// Check that `verify_key` accepts what `sign_key` signs.
pub fn match_sign_key<S, V>(sign_key: &S, verify_key: &V) -> bool
where
    S: SignKey + ?Sized,
    V: VerifyKey + ?Sized,
{
    let signature = sign_key.sign(PROBE_PAYLOAD);
    verify_key.verify(PROBE_PAYLOAD, &signature)
}

/// Symmetric key equality: the same instance, or `b` decrypts what `a` encrypts.
pub fn symmetric_key_equals<K>(a: &K, b: &K) -> bool
where
    K: EncryptKey + DecryptKey + ?Sized,
{
    if ptr::eq(a, b) {
        return true;
    }
    match_encrypt_key(a, b)
}

/// Private key equality: the same instance, or `a`'s public key verifies what
/// `b` signs.
pub fn private_key_equals<K>(a: &K, b: &K) -> bool
where
    K: PrivateKey + ?Sized,
{
    if ptr::eq(a, b) {
        return true;
    }
    match_sign_key(b, &a.public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Ed25519PrivateKey, KeyRecord, SymmetricKey, X25519PrivateKey};
    use crate::error::Result;
    use crate::transportable;
    use serde_json::json;
    use std::cell::Cell;

    /// XOR "cipher" that counts how often it is used.
    struct CountingKey {
        mask: u8,
        calls: Cell<usize>,
    }

    impl CountingKey {
        fn new(mask: u8) -> Self {
            Self {
                mask,
                calls: Cell::new(0),
            }
        }
    }

    impl EncryptKey for CountingKey {
        fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(plaintext.iter().map(|b| b ^ self.mask).collect())
        }
    }

    impl DecryptKey for CountingKey {
        fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            Ok(ciphertext.iter().map(|b| b ^ self.mask).collect())
        }
    }

    #[test]
    fn test_match_encrypt_key_pair() {
        let private = X25519PrivateKey::generate();
        let unrelated = X25519PrivateKey::generate();
        assert!(match_encrypt_key(&private.public_key(), &private));
        assert!(!match_encrypt_key(&private.public_key(), &unrelated));
    }

    #[test]
    fn test_match_sign_key_pair() {
        let key = Ed25519PrivateKey::generate();
        let other = Ed25519PrivateKey::generate();
        assert!(match_sign_key(&key, &key.public_key()));
        assert!(!match_sign_key(&other, &key.public_key()));
    }

    #[test]
    fn test_symmetric_identity_fast_path() {
        let key = CountingKey::new(0x5a);
        assert!(symmetric_key_equals(&key, &key));
        assert_eq!(key.calls.get(), 0);
    }

    #[test]
    fn test_symmetric_probe_path() {
        let a = CountingKey::new(0x5a);
        let b = CountingKey::new(0x5a);
        let c = CountingKey::new(0x33);
        assert!(symmetric_key_equals(&a, &b));
        assert_eq!(a.calls.get(), 1);
        assert_eq!(b.calls.get(), 1);
        assert!(!symmetric_key_equals(&a, &c));
    }

    #[test]
    fn test_symmetric_equal_keys_with_different_records() {
        let a = SymmetricKey::from_bytes([7; 32]);

        // Same material, but unpadded, with a lower-case algorithm name and
        // extra fields from another client
        let unpadded = transportable::encode(&[7; 32]).trim_end_matches('=').to_string();
        let map = match json!({
            "algorithm": "chacha20-poly1305",
            "data": unpadded,
            "created": 1_545_405_083,
            "kid": "k-1",
        }) {
            serde_json::Value::Object(map) => map,
            _ => panic!("not a map"),
        };
        let other_record = KeyRecord::from_record(&map).unwrap();
        assert_ne!(other_record, a.to_key_record());
        let b = SymmetricKey::from_key_record(&other_record).unwrap();

        let c = SymmetricKey::from_bytes([8; 32]);
        assert!(symmetric_key_equals(&a, &b));
        assert!(!symmetric_key_equals(&a, &c));
    }

    #[test]
    fn test_private_key_equals() {
        let a = Ed25519PrivateKey::from_seed(&[1; 32]);
        let same = Ed25519PrivateKey::from_seed(&[1; 32]);
        let other = Ed25519PrivateKey::from_seed(&[2; 32]);
        assert!(private_key_equals(&a, &a));
        assert!(private_key_equals(&a, &same));
        assert!(!private_key_equals(&a, &other));
    }
}
