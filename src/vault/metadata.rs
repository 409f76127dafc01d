//! Vault metadata file and its HMAC.
//!
//! `vault.meta` is a JSON document holding everything needed to turn a
//! password back into the vault master key, plus an HMAC over the rest
//! of the document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "kdf_ops_limit": 3,
//!   "kdf_mem_limit": 67108864,
//!   "kdf_salt": "<base64>",
//!   "wrapped_vmk_nonce": "<base64>",
//!   "wrapped_vmk_cipher_text": "<base64>",
//!   "hmac": "<base64>"
//! }
//! ```
//!
//! The HMAC is keyed by the password-derived key and computed over the
//! compact serialization of every field except `hmac` itself.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::crypto::mac;
use crate::crypto::wrap::WrappedKey;
use crate::errors::{Result, StrongboxError};
use crate::storage::Storage;

/// Current metadata format version.
pub const CURRENT_VERSION: u32 = 1;

/// Everything persisted about a vault except the HMAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    /// Format version.
    pub version: u32,

    /// Argon2id passes used at creation.
    pub kdf_ops_limit: u64,

    /// Argon2id memory in bytes used at creation.
    pub kdf_mem_limit: u64,

    /// Salt for the password KDF (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub kdf_salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_vmk_nonce: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_vmk_cipher_text: Vec<u8>,
}

/// On-disk shape: the metadata fields plus their HMAC.
#[derive(Serialize, Deserialize)]
struct StoredMetadata {
    #[serde(flatten)]
    meta: VaultMetadata,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    hmac: Vec<u8>,
}

impl VaultMetadata {
    /// Build metadata for a freshly wrapped VMK.
    pub fn new(params: &KdfParams, kdf_salt: &[u8], wrapped: WrappedKey) -> Self {
        Self {
            version: CURRENT_VERSION,
            kdf_ops_limit: params.ops_limit,
            kdf_mem_limit: params.mem_limit,
            kdf_salt: kdf_salt.to_vec(),
            wrapped_vmk_nonce: wrapped.nonce,
            wrapped_vmk_cipher_text: wrapped.cipher_text,
        }
    }

    /// The KDF cost the vault was created with.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            ops_limit: self.kdf_ops_limit,
            mem_limit: self.kdf_mem_limit,
        }
    }

    /// The wrapped VMK.
    pub fn wrapped_key(&self) -> WrappedKey {
        WrappedKey {
            nonce: self.wrapped_vmk_nonce.clone(),
            cipher_text: self.wrapped_vmk_cipher_text.clone(),
        }
    }

    /// The bytes the HMAC is computed over.
    fn signed_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| StrongboxError::Serialization(format!("metadata: {e}")))
    }
}

/// Serialize `meta`, sign it with `derived_key`, and write it to `path`.
pub fn save<S: Storage>(
    storage: &S,
    path: &Path,
    meta: &VaultMetadata,
    derived_key: &[u8],
) -> Result<()> {
    let hmac = mac::compute_hmac(derived_key, &meta.signed_bytes()?)?;

    let stored = StoredMetadata {
        meta: meta.clone(),
        hmac,
    };
    let bytes = serde_json::to_vec_pretty(&stored)
        .map_err(|e| StrongboxError::Serialization(format!("metadata: {e}")))?;

    if let Some(parent) = path.parent() {
        storage.create_dir_all(parent)?;
    }
    storage.write(path, &bytes)?;

    tracing::debug!(path = %path.display(), "saved vault metadata");
    Ok(())
}

/// Read metadata **without** checking its HMAC.
///
/// The salt and KDF cost are needed to derive the key that the HMAC is
/// keyed by, so they have to be read before anything can be verified.
/// Callers must follow up with `load` before trusting the result.
pub fn read_unverified<S: Storage>(storage: &S, path: &Path) -> Result<VaultMetadata> {
    read_stored(storage, path).map(|stored| stored.meta)
}

/// Read metadata and verify its HMAC in constant time.
pub fn load<S: Storage>(storage: &S, path: &Path, derived_key: &[u8]) -> Result<VaultMetadata> {
    let stored = read_stored(storage, path)?;

    if !mac::verify_hmac(derived_key, &stored.meta.signed_bytes()?, &stored.hmac)? {
        return Err(StrongboxError::Integrity(
            "vault metadata HMAC does not match".into(),
        ));
    }

    Ok(stored.meta)
}

fn read_stored<S: Storage>(storage: &S, path: &Path) -> Result<StoredMetadata> {
    if !storage.exists(path) {
        return Err(StrongboxError::NotFound(format!(
            "vault metadata at {}",
            path.display()
        )));
    }

    let bytes = storage.read(path)?;

    // A document that no longer parses has, by definition, failed
    // authentication: report it the same way as an HMAC mismatch.
    let stored: StoredMetadata = serde_json::from_slice(&bytes).map_err(|e| {
        StrongboxError::Integrity(format!("vault metadata is unreadable: {e}"))
    })?;

    if stored.meta.version > CURRENT_VERSION {
        return Err(StrongboxError::Version {
            found: stored.meta.version,
            supported: CURRENT_VERSION,
        });
    }

    Ok(stored)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn sample() -> VaultMetadata {
        VaultMetadata::new(
            &KdfParams::default(),
            &[9u8; 32],
            WrappedKey {
                nonce: vec![1u8; 24],
                cipher_text: vec![2u8; 48],
            },
        )
    }

    #[test]
    fn save_then_load_round_trip() {
        let storage = MemoryStorage::new();
        let path = Path::new("/vault/vault.meta");
        let key = [5u8; 32];

        save(&storage, path, &sample(), &key).unwrap();
        let loaded = load(&storage, path, &key).unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.kdf_params(), KdfParams::default());
    }

    #[test]
    fn save_creates_parent_directory() {
        let storage = MemoryStorage::new();
        let path = Path::new("/deep/nested/vault.meta");
        save(&storage, path, &sample(), &[5u8; 32]).unwrap();
        save(&storage, path, &sample(), &[5u8; 32]).unwrap();
        assert!(storage.exists(path));
    }

    #[test]
    fn wrong_key_is_integrity_error() {
        let storage = MemoryStorage::new();
        let path = Path::new("/vault/vault.meta");
        save(&storage, path, &sample(), &[5u8; 32]).unwrap();

        let result = load(&storage, path, &[6u8; 32]);
        assert!(matches!(result, Err(StrongboxError::Integrity(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let storage = MemoryStorage::new();
        let result = load(&storage, Path::new("/vault/vault.meta"), &[5u8; 32]);
        assert!(matches!(result, Err(StrongboxError::NotFound(_))));
    }

    #[test]
    fn garbage_file_is_integrity_error() {
        let storage = MemoryStorage::new();
        storage.create_dir_all(Path::new("/vault")).unwrap();
        let path = Path::new("/vault/vault.meta");
        storage.write(path, b"{not json").unwrap();

        let result = load(&storage, path, &[5u8; 32]);
        assert!(matches!(result, Err(StrongboxError::Integrity(_))));
    }

    #[test]
    fn newer_version_is_version_error() {
        let storage = MemoryStorage::new();
        let path = Path::new("/vault/vault.meta");
        let mut meta = sample();
        meta.version = CURRENT_VERSION + 1;
        save(&storage, path, &meta, &[5u8; 32]).unwrap();

        let result = load(&storage, path, &[5u8; 32]);
        assert!(matches!(
            result,
            Err(StrongboxError::Version { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn modified_field_is_integrity_error() {
        let storage = MemoryStorage::new();
        let path = Path::new("/vault/vault.meta");
        let key = [5u8; 32];
        save(&storage, path, &sample(), &key).unwrap();

        let text = String::from_utf8(storage.read(path).unwrap()).unwrap();
        let tampered = text.replace("\"kdf_ops_limit\": 3", "\"kdf_ops_limit\": 1");
        assert_ne!(text, tampered);
        storage.write(path, tampered.as_bytes()).unwrap();

        let result = load(&storage, path, &key);
        assert!(matches!(result, Err(StrongboxError::Integrity(_))));
    }

    #[test]
    fn binary_fields_are_base64_in_json() {
        let storage = MemoryStorage::new();
        let path = Path::new("/vault/vault.meta");
        save(&storage, path, &sample(), &[5u8; 32]).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&storage.read(path).unwrap()).unwrap();
        for field in [
            "kdf_salt",
            "wrapped_vmk_nonce",
            "wrapped_vmk_cipher_text",
            "hmac",
        ] {
            assert!(json[field].is_string(), "{field} should be a string");
        }
        assert_eq!(json["version"], 1);
    }
}
