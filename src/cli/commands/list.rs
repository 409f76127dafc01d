//! `strongbox list` — display all records in a table.

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = unlock_vault(cli)?;
    let entries = manager.records()?.entries()?;

    output::info(&format!("{} record(s)", entries.len()));
    output::print_records_table(&entries);

    Ok(())
}
