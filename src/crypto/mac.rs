//! HMAC-SHA256 tags and SHA-256 content digests.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{Result, StrongboxError};

/// Size of an HMAC-SHA256 tag in bytes.
pub const HMAC_LEN: usize = 32;

/// Compute HMAC-SHA256 over `data`.
pub fn compute_hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StrongboxError::Validation(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Check an HMAC-SHA256 tag in constant time.
///
/// Returns `Ok(false)` on mismatch so each caller picks its own error.
pub fn verify_hmac(key: &[u8], data: &[u8], expected: &[u8]) -> Result<bool> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| StrongboxError::Validation(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.verify_slice(expected).is_ok())
}

/// SHA-256 digest of `data`, base64-encoded.
pub fn digest(data: &[u8]) -> String {
    BASE64.encode(Sha256::digest(data))
}

/// Compare two encoded digests without leaking where they differ.
pub fn digests_match(actual: &str, expected: &str) -> bool {
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
