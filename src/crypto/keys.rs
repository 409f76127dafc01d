//! Key material held in memory.
//!
//! From the vault master key we derive a unique **per-record** encryption
//! key for each record salt.  HKDF (RFC 5869) uses the record salt as the
//! HKDF salt and the master key as input keying material, so knowing one
//! record key reveals neither the master key nor any other record key.

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, StrongboxError};

/// Length of the vault master key (256 bits).
pub const VMK_LEN: usize = 32;

/// Length of derived record keys (256 bits).
const KEY_LEN: usize = 32;

/// Context string binding HKDF output to record encryption.
const RECORD_KEY_INFO: &[u8] = b"strongbox-record-key";

/// A wrapper around the 32-byte vault master key that automatically
/// zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; VMK_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; VMK_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random master key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VMK_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Access the raw key bytes (e.g. to pass to HKDF or HMAC).
    pub fn as_bytes(&self) -> &[u8; VMK_LEN] {
        &self.bytes
    }

    /// Copy the key into a buffer that is wiped on drop.
    pub fn to_zeroizing(&self) -> Zeroizing<[u8; VMK_LEN]> {
        Zeroizing::new(self.bytes)
    }

    /// Derive the encryption key for a record with the given salt.
    pub fn derive_record_key(&self, record_salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        derive_record_key(&self.bytes, record_salt)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Derive a per-record encryption key from the master key and record salt.
pub fn derive_record_key(master_key: &[u8], record_salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if record_salt.is_empty() {
        return Err(StrongboxError::Validation(
            "record salt cannot be empty".into(),
        ));
    }

    let hk = Hkdf::<Sha256>::new(Some(record_salt), master_key);

    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(RECORD_KEY_INFO, okm.as_mut())
        .map_err(|e| StrongboxError::EncryptionFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}
