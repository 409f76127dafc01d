//! Tamper detection for vault files.
//!
//! This module provides:
//! - Building and signing `MANIFEST.json` / `MANIFEST.hmac` (`manifest`)
//! - Checking a vault against its manifest (`checker`)

pub mod checker;
pub mod manifest;

pub use checker::{verify, IntegrityReport, IntegrityStatus};
pub use manifest::{update, update_or_warn, Manifest, ManifestEntry};
