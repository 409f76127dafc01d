//! XChaCha20-Poly1305 authenticated encryption.
//!
//! Each call to `seal` generates a fresh random 24-byte nonce, large
//! enough that random nonces never collide in practice under one key.
//!
//! Layout of a sealed blob when stored as one buffer:
//!   [ 24-byte nonce | ciphertext + 16-byte Poly1305 tag ]

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::errors::{Result, StrongboxError};

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Returns `(nonce, ciphertext || tag)`.
#[allow(deprecated)]
pub fn seal(key: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = XChaCha20Poly1305::new(key.into());

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| StrongboxError::EncryptionFailed(e.to_string()))?;

    Ok((nonce, ciphertext))
}

/// Decrypt and authenticate a ciphertext produced by `seal`.
///
/// Any tag failure (wrong key, modified ciphertext, modified AAD) is
/// reported as `StrongboxError::Authentication`.
#[allow(deprecated)]
pub fn open(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(StrongboxError::Corrupted(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| StrongboxError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_with_aad() {
        let key = [0x42u8; 32];
        let (nonce, ct) = seal(&key, b"secret data", b"record:1").unwrap();
        assert_eq!(ct.len(), b"secret data".len() + TAG_LEN);

        let pt = open(&key, &nonce, &ct, b"record:1").unwrap();
        assert_eq!(pt, b"secret data");
    }

    #[test]
    fn wrong_aad_fails() {
        let key = [0x42u8; 32];
        let (nonce, ct) = seal(&key, b"secret", b"record:1").unwrap();
        let result = open(&key, &nonce, &ct, b"record:2");
        assert!(matches!(result, Err(StrongboxError::Authentication)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [0x42u8; 32];
        let (nonce, mut ct) = seal(&key, b"secret", b"").unwrap();
        ct[0] ^= 0x01;
        assert!(matches!(
            open(&key, &nonce, &ct, b""),
            Err(StrongboxError::Authentication)
        ));
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let key = [0x42u8; 32];
        let (n1, c1) = seal(&key, b"same input", b"").unwrap();
        let (n2, c2) = seal(&key, b"same input", b"").unwrap();
        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn short_nonce_is_corrupted() {
        let key = [0x42u8; 32];
        let result = open(&key, &[0u8; 12], &[0u8; 32], b"");
        assert!(matches!(result, Err(StrongboxError::Corrupted(_))));
    }
}
