//! `strongbox passwd` — change the vault password.
//!
//! Only the wrapped master key is re-encrypted; records are untouched.

use crate::cli::output;
use crate::cli::{open_manager, prompt_new_password, prompt_password, require_vault, Cli};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut manager = open_manager(cli)?;
    require_vault(&manager)?;

    output::info("Enter your current vault password.");
    let old_password = prompt_password()?;

    output::info("Choose your new vault password.");
    let new_password = prompt_new_password()?;

    manager.change_password(&old_password, &new_password)?;

    output::success("Vault password changed.");

    Ok(())
}
