//! Authenticated encryption for credential payloads (AES-256-GCM).
//!
//! Wire shape per record: a 12-byte nonce and a ciphertext that carries the
//! 16-byte authentication tag. Nonce and salt are generated fresh for every
//! seal and are never reused for a given key.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};
use crate::kdf::{VaultKey, SALT_SIZE};

/// Nonce size for AES-GCM (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Generate a fresh random KDF salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Generate a fresh random AES-GCM nonce.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt a payload under the given key with a fresh nonce.
///
/// Returns `(ciphertext, nonce)`; the ciphertext includes the auth tag.
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> VaultResult<(Vec<u8>, [u8; NONCE_SIZE])> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::DataCorruption(format!("invalid key length: {e}")))?;

    let nonce_bytes = generate_nonce();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| VaultError::DataCorruption("encryption failed".into()))?;

    Ok((ciphertext, nonce_bytes))
}

/// Decrypt a payload; any tag mismatch surfaces as [`VaultError::WrongSecret`].
///
/// The cipher cannot tell a wrong key from a tampered ciphertext, and neither
/// can we: both collapse into the same accept/reject signal.
pub fn open(
    key: &VaultKey,
    nonce_bytes: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> VaultResult<Zeroizing<Vec<u8>>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::DataCorruption(format!("invalid key length: {e}")))?;

    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::WrongSecret)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KEY_SIZE;

    fn test_key(byte: u8) -> VaultKey {
        VaultKey::from_material(&[byte; KEY_SIZE]).unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let key = test_key(3);
        let (ciphertext, nonce) = seal(&key, b"alice:s3cr3t").unwrap();
        let plaintext = open(&key, &nonce, &ciphertext).unwrap();
        assert_eq!(&plaintext[..], b"alice:s3cr3t");
    }

    #[test]
    fn wrong_key_is_wrong_secret() {
        let (ciphertext, nonce) = seal(&test_key(3), b"payload").unwrap();
        let err = open(&test_key(4), &nonce, &ciphertext).unwrap_err();
        assert!(matches!(err, VaultError::WrongSecret));
    }

    #[test]
    fn tampered_ciphertext_is_wrong_secret() {
        let key = test_key(3);
        let (mut ciphertext, nonce) = seal(&key, b"payload").unwrap();
        ciphertext[0] ^= 0x01;
        let err = open(&key, &nonce, &ciphertext).unwrap_err();
        assert!(matches!(err, VaultError::WrongSecret));
    }

    #[test]
    fn seal_is_nondeterministic() {
        let key = test_key(3);
        let (c1, n1) = seal(&key, b"payload").unwrap();
        let (c2, n2) = seal(&key, b"payload").unwrap();
        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }
}
