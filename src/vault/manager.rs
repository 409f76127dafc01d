//! Vault lifecycle: create, unlock, lock.
//!
//! A `VaultManager` is either `Locked` or holds the vault master key of
//! an `Unlocked` session.  Everything that reads or writes records goes
//! through `records()`, which borrows the session key.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::config::{IntegrityPolicy, Settings};
use crate::crypto::kdf::{self, KdfParams};
use crate::crypto::keys::{MasterKey, VMK_LEN};
use crate::crypto::wrap;
use crate::errors::{Result, StrongboxError};
use crate::integrity::{self, IntegrityReport};
use crate::storage::{FsStorage, Storage};

use super::exporter;
use super::layout::VaultLayout;
use super::metadata::{self, VaultMetadata};
use super::records::RecordStore;

enum Session {
    Locked,
    Unlocked(MasterKey),
}

/// Owns the storage backend, the vault location, and the session key.
pub struct VaultManager<S: Storage = FsStorage> {
    storage: S,
    layout: VaultLayout,
    kdf_params: KdfParams,
    policy: IntegrityPolicy,
    session: Session,
}

impl<S: Storage> VaultManager<S> {
    /// A locked manager for the vault rooted at `root`.
    ///
    /// `settings` supply the KDF cost for new vaults and the unlock
    /// integrity policy; `settings.vault_dir` is not consulted.
    pub fn new(storage: S, root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            storage,
            layout: VaultLayout::new(root),
            kdf_params: settings.kdf_params(),
            policy: settings.integrity_policy,
            session: Session::Locked,
        }
    }

    pub fn layout(&self) -> &VaultLayout {
        &self.layout
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns `true` if a metadata file exists at the vault root.
    pub fn is_initialized(&self) -> bool {
        self.storage.exists(&self.layout.meta_path())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a new vault protected by `password`, replacing any vault
    /// already at this root.
    ///
    /// Records of a replaced vault are deleted: they were encrypted under
    /// a master key that no longer exists.  The manager is left locked.
    pub fn init(&mut self, password: &str) -> Result<()> {
        self.lock();

        let salt = kdf::generate_salt();
        let derived = kdf::derive(password.as_bytes(), &salt, &self.kdf_params)?;
        let vmk = MasterKey::generate();
        let wrapped = wrap::wrap(&vmk, &derived)?;

        self.storage.create_dir_all(&self.layout.store_dir())?;
        exporter::clear_store(&self.storage, &self.layout)?;

        let meta = VaultMetadata::new(&self.kdf_params, &salt, wrapped);
        metadata::save(&self.storage, &self.layout.meta_path(), &meta, &derived[..])?;

        integrity::update_or_warn(&self.storage, &self.layout, &vmk, "init");

        tracing::info!(root = %self.layout.root().display(), "vault initialized");
        Ok(())
    }

    /// Open the vault with `password`.
    ///
    /// A wrong password fails with `Authentication`; a metadata document
    /// that unwraps but does not authenticate fails with `Integrity`.  A
    /// manifest check that is not `Ok` fails with `Integrity` under
    /// `IntegrityPolicy::Enforce` and is only logged under `Warn`.  On
    /// every failure the manager stays locked.
    pub fn unlock(&mut self, password: &str) -> Result<IntegrityReport> {
        self.lock();

        let vmk = self.open_master_key(password)?;

        let report = integrity::verify(&self.storage, &self.layout, Some(&vmk));
        if !report.is_ok() {
            match self.policy {
                IntegrityPolicy::Enforce => {
                    tracing::error!(status = %report.status, "{}", report.message);
                    return Err(StrongboxError::Integrity(format!(
                        "{}: {}",
                        report.status, report.message
                    )));
                }
                IntegrityPolicy::Warn => {
                    tracing::warn!(
                        status = %report.status,
                        "unlocking despite failed integrity check: {}",
                        report.message
                    );
                }
            }
        }

        self.session = Session::Unlocked(vmk);
        tracing::debug!(root = %self.layout.root().display(), "vault unlocked");
        Ok(report)
    }

    /// Wipe the session key.  Safe to call when already locked.
    pub fn lock(&mut self) {
        if let Session::Unlocked(_) = std::mem::replace(&mut self.session, Session::Locked) {
            tracing::debug!("vault locked");
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.session, Session::Unlocked(_))
    }

    /// A copy of the session key, or `None` while locked.
    pub fn session_vmk(&self) -> Option<Zeroizing<[u8; VMK_LEN]>> {
        self.master_key().map(MasterKey::to_zeroizing)
    }

    pub(crate) fn master_key(&self) -> Option<&MasterKey> {
        match &self.session {
            Session::Unlocked(vmk) => Some(vmk),
            Session::Locked => None,
        }
    }

    fn require_unlocked(&self) -> Result<&MasterKey> {
        self.master_key().ok_or(StrongboxError::Locked)
    }

    // ------------------------------------------------------------------
    // Operations on an open vault
    // ------------------------------------------------------------------

    /// Record operations under the session key.
    pub fn records(&self) -> Result<RecordStore<'_, S>> {
        let vmk = self.require_unlocked()?;
        Ok(RecordStore::new(&self.storage, &self.layout, vmk))
    }

    /// Check the vault against its manifest.
    ///
    /// While locked the manifest HMAC cannot be checked, so the report is
    /// `HmacMismatch`.
    pub fn verify(&self) -> IntegrityReport {
        integrity::verify(&self.storage, &self.layout, self.master_key())
    }

    /// Copy the vault to `dst` with a freshly signed manifest.
    pub fn export_to(&self, dst: impl Into<PathBuf>) -> Result<usize> {
        let vmk = self.require_unlocked()?;
        exporter::export_to(&self.storage, &self.layout, &VaultLayout::new(dst), vmk)
    }

    /// Replace this vault with the one at `src`.
    ///
    /// `vmk` is the master key the source manifest was signed with; with
    /// `None` only the per-file digests are checked.  The session is
    /// locked afterwards since the imported vault may use another key.
    pub fn import_from(&mut self, src: impl Into<PathBuf>, vmk: Option<&MasterKey>) -> Result<usize> {
        let src = VaultLayout::new(src);
        let copied = exporter::import_from(&self.storage, &src, &self.layout, vmk)?;
        self.lock();
        Ok(copied)
    }

    /// Re-protect the master key under `new_password`.
    ///
    /// Records keep their keys: only the wrapped VMK and the metadata
    /// change.  The session state is not affected.
    pub fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        let vmk = self.open_master_key(old_password)?;

        let salt = kdf::generate_salt();
        let derived = kdf::derive(new_password.as_bytes(), &salt, &self.kdf_params)?;
        let wrapped = wrap::wrap(&vmk, &derived)?;

        let meta = VaultMetadata::new(&self.kdf_params, &salt, wrapped);
        metadata::save(&self.storage, &self.layout.meta_path(), &meta, &derived[..])?;

        integrity::update_or_warn(&self.storage, &self.layout, &vmk, "password change");

        tracing::info!(root = %self.layout.root().display(), "vault password changed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Derive, unwrap, then authenticate the metadata.
    ///
    /// Unwrapping comes first so that a wrong password is reported as
    /// `Authentication` rather than as a metadata HMAC mismatch.
    fn open_master_key(&self, password: &str) -> Result<MasterKey> {
        let meta_path = self.layout.meta_path();
        let meta = metadata::read_unverified(&self.storage, &meta_path)?;

        let derived = kdf::derive(password.as_bytes(), &meta.kdf_salt, &meta.kdf_params())?;
        let vmk = wrap::unwrap(&meta.wrapped_key(), &derived)?;

        metadata::load(&self.storage, &meta_path, &derived[..])?;
        Ok(vmk)
    }
}

impl<S: Storage> Drop for VaultManager<S> {
    fn drop(&mut self) {
        self.lock();
    }
}
