//! `strongbox export` — copy the vault to another directory.
//!
//! The copy stays encrypted and gets its own signed manifest, so it can
//! later be restored with `strongbox import`.

use std::path::Path;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::Result;

/// Execute the `export` command.
pub fn execute(cli: &Cli, dst: &Path) -> Result<()> {
    let manager = unlock_vault(cli)?;
    let count = manager.export_to(dst)?;

    output::success(&format!(
        "Exported {count} record file(s) to {}",
        dst.display()
    ));
    output::tip("Restore it with `strongbox import <DIR>`.");

    Ok(())
}
