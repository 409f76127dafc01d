//! File layout of a vault root directory.
//!
//! ```text
//! <root>/vault.meta
//! <root>/vault_store/index.jsonl
//! <root>/vault_store/record_<id>.bin
//! <root>/MANIFEST.json
//! <root>/MANIFEST.hmac
//! ```

use std::path::{Path, PathBuf};

pub const META_FILE: &str = "vault.meta";
pub const STORE_DIR: &str = "vault_store";
pub const INDEX_FILE: &str = "index.jsonl";
pub const MANIFEST_FILE: &str = "MANIFEST.json";
pub const MANIFEST_HMAC_FILE: &str = "MANIFEST.hmac";

const RECORD_PREFIX: &str = "record_";
const RECORD_SUFFIX: &str = ".bin";

/// Paths of every artifact inside one vault root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLayout {
    root: PathBuf,
}

impl VaultLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_path(&self) -> PathBuf {
        self.root.join(META_FILE)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join(STORE_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.store_dir().join(INDEX_FILE)
    }

    pub fn record_path(&self, id: u64) -> PathBuf {
        self.store_dir().join(record_file_name(id))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn manifest_hmac_path(&self) -> PathBuf {
        self.root.join(MANIFEST_HMAC_FILE)
    }

    /// Resolve a manifest-relative path (always `/`-separated).
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

/// `record_<id>.bin`
pub fn record_file_name(id: u64) -> String {
    format!("{RECORD_PREFIX}{id}{RECORD_SUFFIX}")
}

/// Returns `true` for names of the form `record_<digits>.bin`.
pub fn is_record_file(name: &str) -> bool {
    name.strip_prefix(RECORD_PREFIX)
        .and_then(|rest| rest.strip_suffix(RECORD_SUFFIX))
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// Manifest-relative path of the index file.
pub fn index_rel_path() -> String {
    format!("{STORE_DIR}/{INDEX_FILE}")
}

/// Manifest-relative path of a content file.
pub fn record_rel_path(file_name: &str) -> String {
    format!("{STORE_DIR}/{file_name}")
}

/// Returns `true` if `relative` names a file that belongs in a vault.
///
/// Used to refuse manifests that point outside the vault root.
pub fn is_tracked_rel_path(relative: &str) -> bool {
    if relative == META_FILE || relative == index_rel_path() {
        return true;
    }
    relative
        .strip_prefix(STORE_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(is_record_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_names() {
        assert_eq!(record_file_name(42), "record_42.bin");
        assert!(is_record_file("record_42.bin"));
        assert!(!is_record_file("record_.bin"));
        assert!(!is_record_file("record_4a.bin"));
        assert!(!is_record_file("index.jsonl"));
    }

    #[test]
    fn tracked_paths() {
        assert!(is_tracked_rel_path("vault.meta"));
        assert!(is_tracked_rel_path("vault_store/index.jsonl"));
        assert!(is_tracked_rel_path("vault_store/record_1.bin"));
        assert!(!is_tracked_rel_path("../vault.meta"));
        assert!(!is_tracked_rel_path("vault_store/../../etc/passwd"));
        assert!(!is_tracked_rel_path("/etc/passwd"));
        assert!(!is_tracked_rel_path("MANIFEST.json"));
    }

    #[test]
    fn resolve_joins_components() {
        let layout = VaultLayout::new("/data");
        assert_eq!(
            layout.resolve("vault_store/index.jsonl"),
            PathBuf::from("/data/vault_store/index.jsonl")
        );
        assert_eq!(layout.record_path(7), PathBuf::from("/data/vault_store/record_7.bin"));
    }
}
