//! Cryptographic primitives for Strongbox.
//!
//! This module provides:
//! - Argon2id password-based key derivation (`kdf`)
//! - XChaCha20-Poly1305 authenticated encryption (`cipher`)
//! - VMK wrapping under a password-derived key (`wrap`)
//! - The zeroizing `MasterKey` and HKDF per-record keys (`keys`)
//! - HMAC-SHA256 and SHA-256 helpers (`mac`)

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod mac;
pub mod wrap;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{derive, wrap, unwrap, MasterKey, ...};
pub use kdf::{default_params, derive, generate_salt, KdfParams};
pub use keys::{derive_record_key, MasterKey};
pub use wrap::{unwrap, wrap, WrappedKey};
