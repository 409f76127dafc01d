//! Vault module — encrypted record storage.
//!
//! This module provides:
//! - The on-disk file layout of a vault root (`layout`)
//! - HMAC-authenticated vault metadata (`metadata`)
//! - The locked/unlocked `VaultManager` (`manager`)
//! - Per-record encrypted storage behind a name index (`records`)
//! - Export and verified import of whole vaults (`exporter`)

pub mod exporter;
pub mod layout;
pub mod manager;
pub mod metadata;
pub mod records;

// Re-export the most commonly used items.
pub use layout::VaultLayout;
pub use manager::VaultManager;
pub use metadata::VaultMetadata;
pub use records::{RecordEntry, RecordStore};
