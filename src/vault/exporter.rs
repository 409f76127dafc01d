//! Copying a vault between roots.
//!
//! `export_to` writes a self-contained copy with a freshly signed
//! manifest.  `import_from` only trusts a source whose manifest checks
//! out, and checks it before the destination is touched.

use std::path::Path;

use crate::crypto::keys::MasterKey;
use crate::errors::{Result, StrongboxError};
use crate::integrity::checker::{self, HmacCheck};
use crate::integrity::{self, Manifest};
use crate::storage::Storage;

use super::layout::{self, VaultLayout};

/// Copy the vault at `src` into `dst` and sign a manifest for the copy.
///
/// Returns the number of content files copied.
pub fn export_to<S: Storage>(
    storage: &S,
    src: &VaultLayout,
    dst: &VaultLayout,
    vmk: &MasterKey,
) -> Result<usize> {
    reject_same_root(src, dst, "export")?;
    if !storage.exists(&src.meta_path()) {
        return Err(StrongboxError::Validation(format!(
            "no vault at {}",
            src.root().display()
        )));
    }

    storage.create_dir_all(&dst.store_dir())?;
    clear_store(storage, dst)?;

    storage.copy(&src.meta_path(), &dst.meta_path())?;
    if storage.exists(&src.index_path()) {
        storage.copy(&src.index_path(), &dst.index_path())?;
    }

    let mut copied = 0;
    for name in storage.list_dir(&src.store_dir())? {
        if !layout::is_record_file(&name) {
            continue;
        }
        storage.copy(&src.store_dir().join(&name), &dst.store_dir().join(&name))?;
        copied += 1;
    }

    integrity::update(storage, dst, vmk)?;

    tracing::info!(
        src = %src.root().display(),
        dst = %dst.root().display(),
        records = copied,
        "vault exported"
    );
    Ok(copied)
}

/// Replace the vault at `dst` with the one at `src`.
///
/// The source manifest must verify first: its HMAC under `vmk` when a
/// key is given, and the per-file digests always.  On failure `dst` is
/// left as it was.  Returns the number of content files copied.
pub fn import_from<S: Storage>(
    storage: &S,
    src: &VaultLayout,
    dst: &VaultLayout,
    vmk: Option<&MasterKey>,
) -> Result<usize> {
    reject_same_root(src, dst, "import")?;

    let hmac = match vmk {
        Some(key) => HmacCheck::Required(Some(key)),
        None => HmacCheck::Skip,
    };

    let manifest = match checker::check(storage, src, hmac) {
        (report, Some(manifest)) if report.is_ok() => manifest,
        (report, _) => {
            tracing::warn!(
                src = %src.root().display(),
                status = %report.status,
                "refusing import"
            );
            return Err(StrongboxError::Integrity(format!(
                "source vault failed verification ({}): {}",
                report.status, report.message
            )));
        }
    };

    if vmk.is_none() {
        tracing::warn!("importing without manifest HMAC verification");
    }

    storage.create_dir_all(&dst.store_dir())?;
    clear_store(storage, dst)?;

    let copied = copy_listed(storage, src, dst, &manifest)?;
    storage.copy(&src.manifest_path(), &dst.manifest_path())?;
    storage.copy(&src.manifest_hmac_path(), &dst.manifest_hmac_path())?;

    tracing::info!(
        src = %src.root().display(),
        dst = %dst.root().display(),
        records = copied,
        "vault imported"
    );
    Ok(copied)
}

/// Compare two directories, resolving them when they exist.
pub fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Both operations clear `dst` before reading `src`.
fn reject_same_root(src: &VaultLayout, dst: &VaultLayout, op: &str) -> Result<()> {
    if same_dir(src.root(), dst.root()) {
        return Err(StrongboxError::Validation(format!(
            "cannot {op} a vault onto itself ({})",
            src.root().display()
        )));
    }
    Ok(())
}

fn copy_listed<S: Storage>(
    storage: &S,
    src: &VaultLayout,
    dst: &VaultLayout,
    manifest: &Manifest,
) -> Result<usize> {
    let mut records = 0;
    for entry in &manifest.files {
        storage.copy(&src.resolve(&entry.path), &dst.resolve(&entry.path))?;
        if entry.path != layout::META_FILE && entry.path != layout::index_rel_path() {
            records += 1;
        }
    }
    Ok(records)
}

/// Delete the index and every content file under `target`.
pub(crate) fn clear_store<S: Storage>(storage: &S, target: &VaultLayout) -> Result<()> {
    let store_dir = target.store_dir();
    for name in storage.list_dir(&store_dir)? {
        if layout::is_record_file(&name) {
            storage.remove_file(&store_dir.join(&name))?;
        }
    }
    if storage.exists(&target.index_path()) {
        storage.remove_file(&target.index_path())?;
    }
    Ok(())
}
