//! `strongbox init` — create a new vault.

use crate::cli::output;
use crate::cli::{open_manager, prompt_new_password, Cli};
use crate::errors::{Result, StrongboxError};

/// Execute the `init` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let mut manager = open_manager(cli)?;
    let root = manager.layout().root().to_path_buf();

    // 1. An existing vault is only replaced with --force.
    if manager.is_initialized() {
        if !force {
            output::tip("Use `strongbox init --force` to replace it.");
            return Err(StrongboxError::CommandFailed(format!(
                "a vault already exists at {}",
                root.display()
            )));
        }
        tracing::info!(root = %root.display(), "replacing existing vault");
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password()?;

    // 3. Write metadata and the initial manifest.
    manager.init(&password)?;

    output::success(&format!("Vault created at {}", root.display()));
    output::tip("Run `strongbox add <NAME> <TYPE>` to add a record.");
    output::tip("Run `strongbox list` to see all records.");

    Ok(())
}
