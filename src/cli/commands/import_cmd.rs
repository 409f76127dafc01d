//! `strongbox import` — replace the vault with a verified copy.
//!
//! With a password the source is unlocked on its own (so its manifest
//! HMAC is checked with its own key); with `--no-hmac` only the file
//! digests listed in the source manifest are checked.

use std::path::Path;

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_settings, open_manager, prompt_password, Cli};
use crate::config::IntegrityPolicy;
use crate::crypto::keys::MasterKey;
use crate::errors::{Result, StrongboxError};
use crate::storage::FsStorage;
use crate::vault::exporter::same_dir;
use crate::vault::VaultManager;

/// Execute the `import` command.
pub fn execute(cli: &Cli, src: &Path, no_hmac: bool, force: bool) -> Result<()> {
    if !src.is_dir() {
        return Err(StrongboxError::CommandFailed(format!(
            "import source not found: {}",
            src.display()
        )));
    }

    let mut manager = open_manager(cli)?;
    if same_dir(src, manager.layout().root()) {
        return Err(StrongboxError::CommandFailed(
            "refusing to import a vault onto itself".into(),
        ));
    }

    // Unless --force is set, ask before replacing an existing vault.
    if manager.is_initialized() && !force {
        let confirmed = Confirm::new()
            .with_prompt("Replace the current vault with the imported one?")
            .default(false)
            .interact()
            .map_err(|e| StrongboxError::CommandFailed(format!("confirm prompt: {e}")))?;
        if !confirmed {
            return Err(StrongboxError::UserCancelled);
        }
    }

    let source_key = if no_hmac {
        output::warning("Skipping manifest HMAC check — only file digests are verified.");
        None
    } else {
        Some(unlock_source(src)?)
    };

    let count = manager.import_from(src, source_key.as_ref())?;

    output::success(&format!(
        "Imported {count} record file(s) from {}",
        src.display()
    ));

    Ok(())
}

/// Unlock the source vault and take a copy of its master key.
fn unlock_source(src: &Path) -> Result<MasterKey> {
    // The import itself re-checks integrity and fails closed.
    let mut settings = load_settings()?;
    settings.integrity_policy = IntegrityPolicy::Warn;

    let mut source = VaultManager::new(FsStorage::new(), src, &settings);
    let password = prompt_password()?;
    source.unlock(&password)?;

    let vmk = source.session_vmk().ok_or(StrongboxError::Locked)?;
    Ok(MasterKey::new(*vmk))
}
