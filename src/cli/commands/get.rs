//! `strongbox get` — decrypt and print a single record.

use std::io::{self, IsTerminal, Write};

use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let manager = unlock_vault(cli)?;
    let data = manager.records()?.load_record(name)?;

    // Raw bytes to stdout so binary records survive redirection.
    let mut stdout = io::stdout().lock();
    stdout.write_all(&data)?;
    if stdout.is_terminal() && !data.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    Ok(())
}
