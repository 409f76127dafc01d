//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  The cost parameters are stored in the vault
//! metadata, so a vault created today is re-opened with exactly the same
//! cost even if `KdfParams::default()` changes in a later release.

use argon2::{Algorithm, Argon2, Block, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{Result, StrongboxError};

/// Length of a freshly generated salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted by `derive` (128 bits).
pub const MIN_SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for XChaCha20-Poly1305).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in bytes (8 MiB).
pub const MIN_MEM_LIMIT: u64 = 8 * 1024 * 1024;

/// Argon2id cost parameters.
///
/// `ops_limit` is the number of passes over memory, `mem_limit` the size
/// of the working set in bytes.  Parallelism is fixed at one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of iterations (default: 3).
    pub ops_limit: u64,
    /// Memory cost in bytes (default: 64 MiB).
    pub mem_limit: u64,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            ops_limit: 3,
            mem_limit: 64 * 1024 * 1024,
        }
    }
}

/// The recommended cost tier for interactive unlocks.
pub fn default_params() -> KdfParams {
    KdfParams::default()
}

impl KdfParams {
    /// Convert into Argon2 parameters, rejecting unsafe or unrepresentable values.
    fn to_argon2(self) -> Result<Params> {
        if self.ops_limit < 1 {
            return Err(StrongboxError::Validation(
                "KDF ops limit must be at least 1".into(),
            ));
        }
        if self.mem_limit < MIN_MEM_LIMIT {
            return Err(StrongboxError::Validation(format!(
                "KDF memory limit must be at least {MIN_MEM_LIMIT} bytes (got {})",
                self.mem_limit
            )));
        }

        let t_cost = u32::try_from(self.ops_limit).map_err(|_| {
            StrongboxError::Validation(format!("KDF ops limit {} is too large", self.ops_limit))
        })?;
        let m_cost = u32::try_from(self.mem_limit / 1024).map_err(|_| {
            StrongboxError::Validation(format!(
                "KDF memory limit {} is too large",
                self.mem_limit
            ))
        })?;

        Params::new(m_cost, t_cost, 1, Some(KEY_LEN))
            .map_err(|e| StrongboxError::Validation(format!("invalid Argon2 params: {e}")))
    }
}

/// Derive a 32-byte key from a password and salt with explicit parameters.
///
/// The same password + salt + params will always produce the same key.
/// The Argon2 working memory is reserved up front so an allocation
/// failure is reported as `StrongboxError::Resource` instead of aborting.
pub fn derive(password: &[u8], salt: &[u8], params: &KdfParams) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if password.is_empty() {
        return Err(StrongboxError::Validation("password cannot be empty".into()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(StrongboxError::Validation(format!(
            "salt must be at least {MIN_SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let argon2_params = params.to_argon2()?;
    let block_count = argon2_params.block_count();
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut memory: Vec<Block> = Vec::new();
    memory.try_reserve_exact(block_count).map_err(|e| {
        StrongboxError::Resource(format!("{} bytes requested: {e}", params.mem_limit))
    })?;
    memory.resize(block_count, Block::default());

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into_with_memory(password, salt, key.as_mut(), &mut memory)
        .map_err(|e| StrongboxError::Validation(format!("Argon2id hashing failed: {e}")))?;

    tracing::debug!(
        ops_limit = params.ops_limit,
        mem_limit = params.mem_limit,
        "derived key from password"
    );

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
