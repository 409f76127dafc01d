//! `strongbox unlock` — check the password and report vault integrity.

use crate::cli::output;
use crate::cli::{open_manager, prompt_password, require_vault, Cli};
use crate::errors::Result;

/// Execute the `unlock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut manager = open_manager(cli)?;
    require_vault(&manager)?;

    let password = prompt_password()?;
    let report = manager.unlock(&password)?;

    output::success("Vault unlocked.");
    output::print_integrity_report(&report);

    let count = manager.records()?.list()?.len();
    output::info(&format!("{count} record(s)"));

    manager.lock();
    Ok(())
}
