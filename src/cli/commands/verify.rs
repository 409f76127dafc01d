//! `strongbox verify` — check vault files against the signed manifest.
//!
//! Unlocks with the `warn` behaviour regardless of configuration, so a
//! damaged vault is reported instead of refused.

use crate::cli::output;
use crate::cli::{load_settings, prompt_password, require_vault, vault_root, Cli};
use crate::config::IntegrityPolicy;
use crate::errors::{Result, StrongboxError};
use crate::storage::FsStorage;
use crate::vault::VaultManager;

/// Execute the `verify` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut settings = load_settings()?;
    settings.integrity_policy = IntegrityPolicy::Warn;
    let root = vault_root(cli, &settings)?;

    let mut manager = VaultManager::new(FsStorage::new(), root, &settings);
    require_vault(&manager)?;

    let password = prompt_password()?;
    let report = manager.unlock(&password)?;
    output::print_integrity_report(&report);

    if report.is_ok() {
        Ok(())
    } else {
        Err(StrongboxError::Integrity(report.status.to_string()))
    }
}
