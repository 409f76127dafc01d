//! `strongbox remove` — delete a record from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, StrongboxError};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove record '{name}'?"))
            .default(false)
            .interact()
            .map_err(|e| StrongboxError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let manager = unlock_vault(cli)?;
    manager.records()?.remove(name)?;

    output::success(&format!("Removed record '{name}'"));

    Ok(())
}
