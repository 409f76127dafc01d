//! VMK wrapping / unwrapping.
//!
//! The vault master key is encrypted under the password-derived key with
//! XChaCha20-Poly1305.  The AAD is fixed to `"strongbox-vmk-wrap"` to
//! domain-separate key wrapping from record encryption.

use zeroize::{Zeroize, Zeroizing};

use super::cipher::{self, NONCE_LEN};
use super::keys::{MasterKey, VMK_LEN};
use crate::errors::{Result, StrongboxError};

/// AAD used for key wrapping, distinct from record AAD.
const WRAP_AAD: &[u8] = b"strongbox-vmk-wrap";

/// A VMK encrypted under a password-derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    pub nonce: Vec<u8>,
    pub cipher_text: Vec<u8>,
}

/// Wrap (encrypt) the VMK with a derived key.
///
/// Every call draws a new random nonce, so wrapping the same VMK twice
/// yields two different `WrappedKey`s.
pub fn wrap(vmk: &MasterKey, derived_key: &[u8; 32]) -> Result<WrappedKey> {
    let (nonce, cipher_text) = cipher::seal(derived_key, vmk.as_bytes(), WRAP_AAD)?;
    tracing::debug!("wrapped vault master key");
    Ok(WrappedKey {
        nonce: nonce.to_vec(),
        cipher_text,
    })
}

/// Unwrap (decrypt) the VMK.
///
/// A tag failure means the password is wrong or the metadata was
/// modified; the two cases are deliberately indistinguishable.
pub fn unwrap(wrapped: &WrappedKey, derived_key: &[u8; 32]) -> Result<MasterKey> {
    if wrapped.nonce.len() != NONCE_LEN {
        return Err(StrongboxError::Corrupted(format!(
            "wrapped key nonce must be {NONCE_LEN} bytes, got {}",
            wrapped.nonce.len()
        )));
    }

    let plaintext = Zeroizing::new(cipher::open(
        derived_key,
        &wrapped.nonce,
        &wrapped.cipher_text,
        WRAP_AAD,
    )?);

    if plaintext.len() != VMK_LEN {
        return Err(StrongboxError::Corrupted(format!(
            "unwrapped key has wrong length: {} (expected {VMK_LEN})",
            plaintext.len()
        )));
    }

    let mut bytes = [0u8; VMK_LEN];
    bytes.copy_from_slice(&plaintext);
    let vmk = MasterKey::new(bytes);
    bytes.zeroize();

    tracing::debug!("unwrapped and authenticated vault master key");
    Ok(vmk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_unwrap_round_trip() {
        let vmk = MasterKey::new([0xBB; 32]);
        let kek = [0xAA; 32];

        let wrapped = wrap(&vmk, &kek).unwrap();
        assert_eq!(wrapped.nonce.len(), NONCE_LEN);

        let unwrapped = unwrap(&wrapped, &kek).unwrap();
        assert_eq!(unwrapped.as_bytes(), vmk.as_bytes());
    }

    #[test]
    fn wrong_kek_is_authentication_error() {
        let vmk = MasterKey::new([0xBB; 32]);
        let wrapped = wrap(&vmk, &[0xAA; 32]).unwrap();
        let result = unwrap(&wrapped, &[0xCC; 32]);
        assert!(matches!(result, Err(StrongboxError::Authentication)));
    }

    #[test]
    fn rewrapping_uses_a_fresh_nonce() {
        let vmk = MasterKey::new([0xBB; 32]);
        let kek = [0xAA; 32];
        let a = wrap(&vmk, &kek).unwrap();
        let b = wrap(&vmk, &kek).unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn truncated_nonce_is_corrupted() {
        let vmk = MasterKey::new([0xBB; 32]);
        let kek = [0xAA; 32];
        let mut wrapped = wrap(&vmk, &kek).unwrap();
        wrapped.nonce.pop();
        assert!(matches!(
            unwrap(&wrapped, &kek),
            Err(StrongboxError::Corrupted(_))
        ));
    }
}
