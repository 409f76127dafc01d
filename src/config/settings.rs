use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::KdfParams;
use crate::errors::{Result, StrongboxError};

/// What `unlock` does when the manifest check does not come back `Ok`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityPolicy {
    /// Refuse to unlock.
    #[default]
    Enforce,
    /// Log the report and unlock anyway.
    Warn,
}

/// Project-level configuration, loaded from `.strongbox.toml`.
///
/// Every field has a sensible default so Strongbox works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding the vault.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// Argon2id passes for newly created vaults (default: 3).
    #[serde(default = "default_kdf_ops_limit")]
    pub kdf_ops_limit: u64,

    /// Argon2id memory in bytes for newly created vaults (default: 64 MiB).
    #[serde(default = "default_kdf_mem_limit")]
    pub kdf_mem_limit: u64,

    /// Unlock behaviour on a failed integrity check.
    #[serde(default)]
    pub integrity_policy: IntegrityPolicy,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    ".strongbox".to_string()
}

fn default_kdf_ops_limit() -> u64 {
    KdfParams::default().ops_limit
}

fn default_kdf_mem_limit() -> u64 {
    KdfParams::default().mem_limit
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            kdf_ops_limit: default_kdf_ops_limit(),
            kdf_mem_limit: default_kdf_mem_limit(),
            integrity_policy: IntegrityPolicy::default(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    pub const FILE_NAME: &'static str = ".strongbox.toml";

    /// Load settings from `<project_dir>/.strongbox.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            StrongboxError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Full path to the vault root.
    ///
    /// Example: `project_dir/.strongbox`
    pub fn vault_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            ops_limit: self.kdf_ops_limit,
            mem_limit: self.kdf_mem_limit,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
