//! `strongbox add` — add or replace a record.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{unlock_vault, Cli};
use crate::errors::{Result, StrongboxError};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    name: &str,
    record_type: &str,
    value: Option<&str>,
    file: Option<&Path>,
) -> Result<()> {
    // Determine the record value from one of four sources.
    let data: Zeroizing<Vec<u8>> = if let Some(path) = file {
        // Source 1: File contents, byte for byte.
        Zeroizing::new(std::fs::read(path).map_err(|e| {
            StrongboxError::CommandFailed(format!("cannot read {}: {e}", path.display()))
        })?)
    } else if let Some(v) = value {
        // Source 2: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.as_bytes().to_vec())
    } else if !io::stdin().is_terminal() {
        // Source 3: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(Vec::new());
        io::stdin().read_to_end(&mut buf)?;
        let len = trimmed_len(&buf);
        buf.truncate(len);
        buf
    } else {
        // Source 4: Interactive secure prompt.
        let secret = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter value for {name}"))
                .interact()
                .map_err(|e| StrongboxError::CommandFailed(format!("input prompt: {e}")))?,
        );
        Zeroizing::new(secret.as_bytes().to_vec())
    };

    if data.is_empty() {
        return Err(StrongboxError::Validation("record value is empty".into()));
    }

    let manager = unlock_vault(cli)?;
    let records = manager.records()?;

    let existed = records.list()?.iter().any(|n| n == name);
    records.add_record(name, record_type, &data)?;

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!("Record '{name}' {verb} ({} bytes)", data.len()));

    Ok(())
}

/// Length of `buf` without one trailing `\n` or `\r\n`.
fn trimmed_len(buf: &[u8]) -> usize {
    match buf {
        [.., b'\r', b'\n'] => buf.len() - 2,
        [.., b'\n'] => buf.len() - 1,
        _ => buf.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_trailing_newline() {
        assert_eq!(trimmed_len(b"value\n"), 5);
        assert_eq!(trimmed_len(b"value\r\n"), 5);
        assert_eq!(trimmed_len(b"value\n\n"), 6);
        assert_eq!(trimmed_len(b"value"), 5);
        assert_eq!(trimmed_len(b""), 0);
    }
}
