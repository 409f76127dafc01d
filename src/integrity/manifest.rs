//! Manifest of tracked vault files and its HMAC.
//!
//! `MANIFEST.json` lists the SHA-256 digest of every tracked file.
//! `MANIFEST.hmac` holds the raw HMAC-SHA256 of the exact manifest bytes,
//! keyed by the vault master key, so only a holder of the VMK can
//! produce a manifest that verifies.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::MasterKey;
use crate::crypto::mac;
use crate::errors::{Result, StrongboxError};
use crate::storage::Storage;
use crate::vault::layout::{self, VaultLayout};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the vault root, `/`-separated.
    pub path: String,
    /// Base64 SHA-256 of the file contents.
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    /// Digest every tracked file currently present under `layout`.
    ///
    /// Order: metadata, index, then content files sorted by name.
    pub fn collect<S: Storage>(storage: &S, layout: &VaultLayout) -> Result<Self> {
        let meta_path = layout.meta_path();
        if !storage.exists(&meta_path) {
            return Err(StrongboxError::NotFound(format!(
                "vault metadata at {}",
                meta_path.display()
            )));
        }

        let mut files = vec![ManifestEntry {
            path: layout::META_FILE.to_string(),
            digest: mac::digest(&storage.read(&meta_path)?),
        }];

        let index_path = layout.index_path();
        if storage.exists(&index_path) {
            files.push(ManifestEntry {
                path: layout::index_rel_path(),
                digest: mac::digest(&storage.read(&index_path)?),
            });
        }

        let store_dir = layout.store_dir();
        for name in storage.list_dir(&store_dir)? {
            if !layout::is_record_file(&name) {
                continue;
            }
            files.push(ManifestEntry {
                digest: mac::digest(&storage.read(&store_dir.join(&name))?),
                path: layout::record_rel_path(&name),
            });
        }

        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }
}

/// Rebuild and sign the manifest for the vault under `layout`.
pub fn update<S: Storage>(storage: &S, layout: &VaultLayout, vmk: &MasterKey) -> Result<Manifest> {
    let manifest = Manifest::collect(storage, layout)?;

    let bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| StrongboxError::Serialization(format!("manifest: {e}")))?;
    let tag = mac::compute_hmac(vmk.as_bytes(), &bytes)?;

    storage.create_dir_all(layout.root())?;
    storage.write(&layout.manifest_path(), &bytes)?;
    storage.write(&layout.manifest_hmac_path(), &tag)?;

    tracing::info!(
        root = %layout.root().display(),
        files = manifest.files.len(),
        "manifest updated"
    );
    Ok(manifest)
}

/// Rebuild the manifest after a mutation, logging instead of failing.
///
/// The manifest is an auxiliary integrity aid: a mutation that already
/// reached disk is reported as successful even if this step fails.
pub fn update_or_warn<S: Storage>(storage: &S, layout: &VaultLayout, vmk: &MasterKey, after: &str) {
    if let Err(e) = update(storage, layout, vmk) {
        tracing::warn!(error = %e, "manifest update after {after} failed");
    }
}
