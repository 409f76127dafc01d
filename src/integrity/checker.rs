//! Verification of a vault against its signed manifest.

use std::fmt;

use crate::crypto::keys::MasterKey;
use crate::crypto::mac;
use crate::storage::Storage;
use crate::vault::layout::{self, VaultLayout};

use super::manifest::Manifest;

/// Outcome of an integrity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityStatus {
    Ok,
    MissingManifest,
    HmacMismatch,
    HashMismatch,
    Error,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::MissingManifest => "missing manifest",
            Self::HmacMismatch => "manifest HMAC mismatch",
            Self::HashMismatch => "file hash mismatch",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Status plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub status: IntegrityStatus,
    pub message: String,
}

impl IntegrityReport {
    fn new(status: IntegrityStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == IntegrityStatus::Ok
    }
}

/// How the manifest HMAC is treated.
#[derive(Clone, Copy)]
pub(crate) enum HmacCheck<'a> {
    /// Verify with this key; no key means the HMAC cannot be trusted.
    Required(Option<&'a MasterKey>),
    /// Per-file digests only.
    Skip,
}

/// Verify the vault under `layout` against its manifest.
///
/// Never fails: every problem is reported through the returned status.
pub fn verify<S: Storage>(
    storage: &S,
    layout: &VaultLayout,
    vmk: Option<&MasterKey>,
) -> IntegrityReport {
    check(storage, layout, HmacCheck::Required(vmk)).0
}

/// Run the check and hand back the manifest that was verified.
pub(crate) fn check<S: Storage>(
    storage: &S,
    layout: &VaultLayout,
    hmac: HmacCheck<'_>,
) -> (IntegrityReport, Option<Manifest>) {
    match check_manifest(storage, layout, hmac) {
        Ok(manifest) => (
            IntegrityReport::new(IntegrityStatus::Ok, "vault integrity verified"),
            Some(manifest),
        ),
        Err(report) => (report, None),
    }
}

fn fail<T>(status: IntegrityStatus, message: impl Into<String>) -> Result<T, IntegrityReport> {
    Err(IntegrityReport::new(status, message))
}

fn check_manifest<S: Storage>(
    storage: &S,
    layout: &VaultLayout,
    hmac: HmacCheck<'_>,
) -> Result<Manifest, IntegrityReport> {
    let manifest_path = layout.manifest_path();
    let hmac_path = layout.manifest_hmac_path();

    if !storage.exists(&manifest_path) || !storage.exists(&hmac_path) {
        return fail(IntegrityStatus::MissingManifest, "MANIFEST.* not found");
    }

    let manifest_bytes = storage.read(&manifest_path).or_else(|e| {
        fail(IntegrityStatus::Error, format!("cannot read manifest: {e}"))
    })?;
    let tag = storage.read(&hmac_path).or_else(|e| {
        fail(IntegrityStatus::Error, format!("cannot read manifest HMAC: {e}"))
    })?;

    if tag.len() != mac::HMAC_LEN {
        return fail(
            IntegrityStatus::Error,
            format!("manifest HMAC must be {} bytes, got {}", mac::HMAC_LEN, tag.len()),
        );
    }

    match hmac {
        HmacCheck::Required(None) => {
            return fail(
                IntegrityStatus::HmacMismatch,
                "no master key; cannot verify manifest HMAC",
            );
        }
        HmacCheck::Required(Some(vmk)) => {
            let valid = mac::verify_hmac(vmk.as_bytes(), &manifest_bytes, &tag)
                .or_else(|e| fail(IntegrityStatus::Error, e.to_string()))?;
            if !valid {
                return fail(IntegrityStatus::HmacMismatch, "manifest HMAC verification failed");
            }
        }
        HmacCheck::Skip => {}
    }

    let manifest: Manifest = serde_json::from_slice(&manifest_bytes).or_else(|e| {
        fail(IntegrityStatus::Error, format!("manifest is malformed: {e}"))
    })?;

    for entry in &manifest.files {
        if !layout::is_tracked_rel_path(&entry.path) {
            return fail(
                IntegrityStatus::Error,
                format!("manifest lists foreign path '{}'", entry.path),
            );
        }

        let abs = layout.resolve(&entry.path);
        if !storage.exists(&abs) {
            return fail(
                IntegrityStatus::HashMismatch,
                format!("missing file listed in manifest: {}", entry.path),
            );
        }

        let bytes = storage.read(&abs).or_else(|e| {
            fail(IntegrityStatus::Error, format!("cannot read {}: {e}", entry.path))
        })?;

        if !mac::digests_match(&mac::digest(&bytes), &entry.digest) {
            return fail(
                IntegrityStatus::HashMismatch,
                format!("hash mismatch for {}", entry.path),
            );
        }
    }

    Ok(manifest)
}
