//! Encrypted record storage.
//!
//! Each record is encrypted with its own key, derived from the vault
//! master key and a random per-record salt, and lives in its own
//! `record_<id>.bin` file:
//!
//! ```text
//! [ 24-byte nonce | ciphertext + 16-byte tag ]
//! ```
//!
//! `index.jsonl` maps names to ids, one JSON object per line.  The index
//! is rewritten (atomically on `FsStorage`) on every mutation; it is not
//! a transactional store, so two processes writing the same vault can
//! lose each other's entries.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::cipher::{self, NONCE_LEN};
use crate::crypto::keys::MasterKey;
use crate::errors::{Result, StrongboxError};
use crate::integrity;
use crate::storage::Storage;

use super::layout::VaultLayout;
use super::metadata::{base64_decode, base64_encode};

/// Length of the per-record salt in bytes.
const RECORD_SALT_LEN: usize = 32;

/// One line of `index.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Unique id; also names the content file.
    pub id: u64,

    /// Logical key of the record (e.g. "email").
    pub name: String,

    /// Free-form kind, e.g. "login", "note", "file".
    #[serde(rename = "type")]
    pub record_type: String,

    /// When this version of the record was written.
    pub created_at: DateTime<Utc>,

    /// Salt for the record key (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
}

/// Record operations for an unlocked vault.
///
/// Borrows the session master key, so it cannot outlive the session
/// that handed it out.
pub struct RecordStore<'a, S: Storage> {
    storage: &'a S,
    layout: &'a VaultLayout,
    vmk: &'a MasterKey,
}

impl<'a, S: Storage> RecordStore<'a, S> {
    pub fn new(storage: &'a S, layout: &'a VaultLayout, vmk: &'a MasterKey) -> Self {
        Self {
            storage,
            layout,
            vmk,
        }
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Encrypt `data` and store it under `name`, replacing any record
    /// that already has that name.  Returns the new record id.
    pub fn add_record(&self, name: &str, record_type: &str, data: &[u8]) -> Result<u64> {
        validate_name(name)?;
        if record_type.trim().is_empty() {
            return Err(StrongboxError::Validation(
                "record type cannot be empty".into(),
            ));
        }

        let entries = self.read_index_for_update()?;
        let id = self.next_id(&entries);

        let mut salt = vec![0u8; RECORD_SALT_LEN];
        rand::rng().fill_bytes(&mut salt);

        let record_key = self.vmk.derive_record_key(&salt)?;
        let (nonce, cipher_text) = cipher::seal(&record_key, data, &record_aad(id))?;
        drop(record_key);

        let mut blob = Vec::with_capacity(NONCE_LEN + cipher_text.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&cipher_text);

        self.storage.create_dir_all(&self.layout.store_dir())?;
        let record_path = self.layout.record_path(id);
        self.storage.write(&record_path, &blob)?;

        let (superseded, mut kept): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(|e| e.name == name);
        kept.push(RecordEntry {
            id,
            name: name.to_string(),
            record_type: record_type.to_string(),
            created_at: Utc::now(),
            salt,
        });

        if let Err(e) = self.write_index(&kept) {
            // Do not leave an unreferenced ciphertext behind.
            let _ = self.storage.remove_file(&record_path);
            return Err(e);
        }

        for old in &superseded {
            if let Err(e) = self.storage.remove_file(&self.layout.record_path(old.id)) {
                tracing::warn!(id = old.id, error = %e, "could not delete superseded record file");
            }
        }

        tracing::debug!(id, replaced = superseded.len(), "record added");
        integrity::update_or_warn(self.storage, self.layout, self.vmk, "add");
        Ok(id)
    }

    /// Decrypt and return the record stored under `name`.
    ///
    /// If the index holds several entries for `name`, the last one wins.
    pub fn load_record(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        let entries = self.read_index()?;
        let entry = entries
            .iter()
            .rev()
            .find(|e| e.name == name)
            .ok_or_else(|| StrongboxError::NotFound(format!("record '{name}'")))?;

        if entry.salt.is_empty() {
            return Err(StrongboxError::Corrupted(format!(
                "record '{name}' has no salt"
            )));
        }

        let path = self.layout.record_path(entry.id);
        if !self.storage.exists(&path) {
            return Err(StrongboxError::NotFound(format!(
                "content file for record '{name}'"
            )));
        }

        let blob = self.storage.read(&path)?;
        if blob.len() < NONCE_LEN {
            return Err(StrongboxError::Corrupted(format!(
                "record file for '{name}' is too small ({} bytes)",
                blob.len()
            )));
        }
        let (nonce, cipher_text) = blob.split_at(NONCE_LEN);

        let record_key = self.vmk.derive_record_key(&entry.salt)?;
        let plaintext = cipher::open(&record_key, nonce, cipher_text, &record_aad(entry.id))?;

        Ok(Zeroizing::new(plaintext))
    }

    /// Names of all records in index order.
    ///
    /// `add_record` drops older entries for the same name, so an index
    /// written only by this type lists each name once.  An index that was
    /// edited by hand or cut short by a crash may still hold duplicates.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.read_index()?.into_iter().map(|e| e.name).collect())
    }

    /// Full index entries, for display.
    pub fn entries(&self) -> Result<Vec<RecordEntry>> {
        self.read_index()
    }

    /// Delete every index entry named `name` and their content files.
    ///
    /// Once the index is rewritten the record is gone; a content file
    /// that cannot be deleted is logged and left behind.
    pub fn remove(&self, name: &str) -> Result<()> {
        let entries = self.read_index_for_update()?;
        let (removed, kept): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.name == name);

        if removed.is_empty() {
            return Err(StrongboxError::NotFound(format!("record '{name}'")));
        }

        self.write_index(&kept)?;

        for entry in &removed {
            match self.storage.remove_file(&self.layout.record_path(entry.id)) {
                Ok(()) | Err(StrongboxError::NotFound(_)) => {}
                Err(e) => {
                    tracing::warn!(id = entry.id, error = %e, "could not delete removed record file");
                }
            }
        }

        tracing::debug!(removed = removed.len(), "record removed");
        integrity::update_or_warn(self.storage, self.layout, self.vmk, "remove");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Index
    // ------------------------------------------------------------------

    /// Parse the index.  A missing index is an empty vault; lines that
    /// do not parse are skipped.
    fn read_index(&self) -> Result<Vec<RecordEntry>> {
        Ok(self.parse_index()?.0)
    }

    /// Like `read_index`, but refuses an index with unparseable lines,
    /// since rewriting it would drop them.
    fn read_index_for_update(&self) -> Result<Vec<RecordEntry>> {
        let (entries, malformed) = self.parse_index()?;
        if malformed > 0 {
            return Err(StrongboxError::Corrupted(format!(
                "index has {malformed} unreadable line(s); refusing to rewrite it"
            )));
        }
        Ok(entries)
    }

    /// Returns the parsed entries and the number of skipped lines.
    fn parse_index(&self) -> Result<(Vec<RecordEntry>, usize)> {
        let path = self.layout.index_path();
        if !self.storage.exists(&path) {
            return Ok((Vec::new(), 0));
        }

        let bytes = self.storage.read(&path)?;
        let text = String::from_utf8_lossy(&bytes);

        let mut entries = Vec::new();
        let mut malformed = 0;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RecordEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    malformed += 1;
                    tracing::warn!(line = lineno + 1, error = %e, "skipping malformed index line");
                }
            }
        }
        Ok((entries, malformed))
    }

    fn write_index(&self, entries: &[RecordEntry]) -> Result<()> {
        let mut out = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| StrongboxError::Serialization(format!("index entry: {e}")))?;
            out.push_str(&line);
            out.push('\n');
        }

        self.storage.create_dir_all(&self.layout.store_dir())?;
        self.storage.write(&self.layout.index_path(), out.as_bytes())
    }

    /// Pick an id above every id in the index and not used by a file.
    fn next_id(&self, entries: &[RecordEntry]) -> u64 {
        let now = u64::try_from(Utc::now().timestamp_micros()).unwrap_or(0);
        let after_last = entries
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(0, |max| max.saturating_add(1));

        let mut id = now.max(after_last);
        while self.storage.exists(&self.layout.record_path(id)) {
            id = id.saturating_add(1);
        }
        id
    }
}

/// AAD binding a content file to the index entry that points at it.
fn record_aad(id: u64) -> Vec<u8> {
    format!("strongbox-record:{id}").into_bytes()
}

/// Validate that a record name is usable.
///
/// Must be non-empty, at most 256 bytes, and free of control characters.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StrongboxError::Validation(
            "record name cannot be empty".into(),
        ));
    }
    if name.len() > 256 {
        return Err(StrongboxError::Validation(
            "record name cannot exceed 256 bytes".into(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(StrongboxError::Validation(format!(
            "record name {name:?} contains control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::{verify, IntegrityStatus};
    use crate::storage::MemoryStorage;
    use std::path::Path;

    /// Memory storage whose record files cannot be deleted.
    #[derive(Default)]
    struct StickyRecords(MemoryStorage);

    impl Storage for StickyRecords {
        fn read(&self, path: &Path) -> Result<Vec<u8>> {
            self.0.read(path)
        }

        fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
            self.0.write(path, data)
        }

        fn exists(&self, path: &Path) -> bool {
            self.0.exists(path)
        }

        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.0.create_dir_all(path)
        }

        fn remove_file(&self, path: &Path) -> Result<()> {
            let is_record = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("record_"));
            if is_record {
                return Err(StrongboxError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                )));
            }
            self.0.remove_file(path)
        }

        fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
            self.0.list_dir(dir)
        }
    }

    struct Fixture {
        storage: MemoryStorage,
        layout: VaultLayout,
        vmk: MasterKey,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = MemoryStorage::new();
            let layout = VaultLayout::new("/vault");
            storage.create_dir_all(layout.root()).unwrap();
            // The manifest needs a metadata file to exist.
            storage.write(&layout.meta_path(), b"{}").unwrap();
            Self {
                storage,
                layout,
                vmk: MasterKey::new([0x5A; 32]),
            }
        }

        fn store(&self) -> RecordStore<'_, MemoryStorage> {
            RecordStore::new(&self.storage, &self.layout, &self.vmk)
        }

        fn record_files(&self) -> Vec<String> {
            self.storage
                .list_dir(&self.layout.store_dir())
                .unwrap()
                .into_iter()
                .filter(|n| n.starts_with("record_"))
                .collect()
        }
    }

    #[test]
    fn add_then_load_returns_same_bytes() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("n", "note", b"hello world").unwrap();
        assert_eq!(store.load_record("n").unwrap().as_slice(), b"hello world");
    }

    #[test]
    fn binary_and_empty_payloads_survive() {
        let fx = Fixture::new();
        let store = fx.store();
        let binary: Vec<u8> = (0..=255).collect();
        store.add_record("bin", "file", &binary).unwrap();
        store.add_record("empty", "note", b"").unwrap();
        assert_eq!(store.load_record("bin").unwrap().as_slice(), binary.as_slice());
        assert!(store.load_record("empty").unwrap().is_empty());
    }

    #[test]
    fn load_missing_is_not_found() {
        let fx = Fixture::new();
        let result = fx.store().load_record("missing");
        assert!(matches!(result, Err(StrongboxError::NotFound(_))));
    }

    #[test]
    fn upsert_keeps_one_entry_and_one_file() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("email", "login", b"b1").unwrap();
        store.add_record("email", "login", b"b2").unwrap();

        assert_eq!(store.load_record("email").unwrap().as_slice(), b"b2");
        assert_eq!(store.list().unwrap(), vec!["email"]);
        assert_eq!(fx.record_files().len(), 1);
    }

    #[test]
    fn ids_increase() {
        let fx = Fixture::new();
        let store = fx.store();
        let a = store.add_record("a", "note", b"1").unwrap();
        let b = store.add_record("b", "note", b"2").unwrap();
        assert!(b > a);
    }

    #[test]
    fn records_use_distinct_salts() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"same").unwrap();
        store.add_record("b", "note", b"same").unwrap();
        let entries = store.entries().unwrap();
        assert_ne!(entries[0].salt, entries[1].salt);
        assert_eq!(entries[0].record_type, "note");
    }

    #[test]
    fn remove_deletes_entry_and_file() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"1").unwrap();
        store.add_record("b", "note", b"2").unwrap();

        store.remove("a").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b"]);
        assert_eq!(fx.record_files().len(), 1);
        assert!(matches!(store.remove("a"), Err(StrongboxError::NotFound(_))));
    }

    #[test]
    fn truncated_content_is_corrupted() {
        let fx = Fixture::new();
        let store = fx.store();
        let id = store.add_record("a", "note", b"payload").unwrap();
        fx.storage.write(&fx.layout.record_path(id), &[0u8; 10]).unwrap();
        assert!(matches!(
            store.load_record("a"),
            Err(StrongboxError::Corrupted(_))
        ));
    }

    #[test]
    fn tampered_content_is_authentication_error() {
        let fx = Fixture::new();
        let store = fx.store();
        let id = store.add_record("a", "note", b"payload").unwrap();
        let path = fx.layout.record_path(id);
        let mut blob = fx.storage.read(&path).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        fx.storage.write(&path, &blob).unwrap();

        assert!(matches!(
            store.load_record("a"),
            Err(StrongboxError::Authentication)
        ));
    }

    #[test]
    fn swapped_content_files_fail_authentication() {
        let fx = Fixture::new();
        let store = fx.store();
        let a = store.add_record("a", "note", b"alpha").unwrap();
        let b = store.add_record("b", "note", b"bravo").unwrap();
        let blob_b = fx.storage.read(&fx.layout.record_path(b)).unwrap();
        fx.storage.write(&fx.layout.record_path(a), &blob_b).unwrap();

        assert!(matches!(
            store.load_record("a"),
            Err(StrongboxError::Authentication)
        ));
    }

    #[test]
    fn other_master_key_cannot_read() {
        let fx = Fixture::new();
        fx.store().add_record("a", "note", b"alpha").unwrap();

        let other = MasterKey::new([0x11; 32]);
        let store = RecordStore::new(&fx.storage, &fx.layout, &other);
        assert!(matches!(
            store.load_record("a"),
            Err(StrongboxError::Authentication)
        ));
    }

    #[test]
    fn missing_content_file_is_not_found() {
        let fx = Fixture::new();
        let store = fx.store();
        let id = store.add_record("a", "note", b"alpha").unwrap();
        fx.storage.remove_file(&fx.layout.record_path(id)).unwrap();
        assert!(matches!(
            store.load_record("a"),
            Err(StrongboxError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_index_lines_resolve_to_last() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"first").unwrap();
        store.add_record("b", "note", b"second").unwrap();

        // Rename "b"'s entry to "a", leaving two "a" lines.
        let index = fx.storage.read(&fx.layout.index_path()).unwrap();
        let text = String::from_utf8(index).unwrap();
        let edited = text.replace("\"name\":\"b\"", "\"name\":\"a\"");
        assert_ne!(text, edited);
        fx.storage.write(&fx.layout.index_path(), edited.as_bytes()).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a", "a"]);
        assert_eq!(store.load_record("a").unwrap().as_slice(), b"second");
    }

    #[test]
    fn malformed_index_lines_are_skipped() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"alpha").unwrap();
        let mut index = fx.storage.read(&fx.layout.index_path()).unwrap();
        index.extend_from_slice(b"not json\r\n\n");
        fx.storage.write(&fx.layout.index_path(), &index).unwrap();

        assert_eq!(store.list().unwrap(), vec!["a"]);
        assert_eq!(store.load_record("a").unwrap().as_slice(), b"alpha");
    }

    #[test]
    fn mutations_refuse_an_index_with_unreadable_lines() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"alpha").unwrap();
        store.add_record("b", "note", b"bravo").unwrap();

        // Cut the closing brace off b's line.
        let text = String::from_utf8(fx.storage.read(&fx.layout.index_path()).unwrap()).unwrap();
        let damaged = text.replacen("}\n", "\n", 2).replacen("\n", "}\n", 1);
        assert_ne!(text, damaged);
        fx.storage.write(&fx.layout.index_path(), damaged.as_bytes()).unwrap();

        assert!(matches!(
            store.add_record("c", "note", b"charlie"),
            Err(StrongboxError::Corrupted(_))
        ));
        assert!(matches!(store.remove("a"), Err(StrongboxError::Corrupted(_))));

        // Nothing was rewritten and no file was added or lost.
        assert_eq!(fx.storage.read(&fx.layout.index_path()).unwrap(), damaged.as_bytes());
        assert_eq!(fx.record_files().len(), 2);
        assert_eq!(store.list().unwrap(), vec!["a"]);
    }

    #[test]
    fn remove_commits_even_when_the_file_cannot_be_deleted() {
        let storage = StickyRecords::default();
        let layout = VaultLayout::new("/vault");
        let vmk = MasterKey::new([0x5A; 32]);
        storage.create_dir_all(layout.root()).unwrap();
        storage.write(&layout.meta_path(), b"{}").unwrap();

        let store = RecordStore::new(&storage, &layout, &vmk);
        store.add_record("a", "note", b"alpha").unwrap();
        store.add_record("b", "note", b"bravo").unwrap();

        store.remove("a").unwrap();
        assert_eq!(store.list().unwrap(), vec!["b"]);

        let report = verify(&storage, &layout, Some(&vmk));
        assert_eq!(report.status, IntegrityStatus::Ok, "{}", report.message);
    }

    #[test]
    fn empty_name_or_type_is_rejected() {
        let fx = Fixture::new();
        let store = fx.store();
        assert!(matches!(
            store.add_record("", "note", b"x"),
            Err(StrongboxError::Validation(_))
        ));
        assert!(matches!(
            store.add_record("a", " ", b"x"),
            Err(StrongboxError::Validation(_))
        ));
        assert!(matches!(
            store.add_record("a\nb", "note", b"x"),
            Err(StrongboxError::Validation(_))
        ));
    }

    #[test]
    fn mutations_keep_manifest_current() {
        let fx = Fixture::new();
        let store = fx.store();
        store.add_record("a", "note", b"alpha").unwrap();
        store.add_record("b", "note", b"bravo").unwrap();
        store.remove("a").unwrap();

        let report = verify(&fx.storage, &fx.layout, Some(&fx.vmk));
        assert_eq!(report.status, IntegrityStatus::Ok, "{}", report.message);
    }

    #[test]
    fn list_on_empty_vault_is_empty() {
        let fx = Fixture::new();
        assert!(fx.store().list().unwrap().is_empty());
    }
}
