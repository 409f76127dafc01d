//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, StrongboxError};
use crate::storage::FsStorage;
use crate::vault::VaultManager;

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "STRONGBOX_PASSWORD";

/// Strongbox CLI: local encrypted record vault.
#[derive(Parser)]
#[command(
    name = "strongbox",
    about = "Local encrypted record vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: `vault_dir` from .strongbox.toml, or .strongbox)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init {
        /// Replace an existing vault (its records are deleted)
        #[arg(long)]
        force: bool,
    },

    /// Check the password and the vault's integrity
    Unlock,

    /// Add a record, replacing any record with the same name
    Add {
        /// Record name (e.g. email)
        name: String,
        /// Record type (e.g. login, note, file)
        record_type: String,
        /// Record value (omit to read stdin or prompt)
        value: Option<String>,
        /// Read the value from a file instead
        #[arg(long, conflicts_with = "value")]
        file: Option<PathBuf>,
    },

    /// Print a record's decrypted value
    Get {
        /// Record name
        name: String,
    },

    /// List all records
    List,

    /// Remove a record
    Remove {
        /// Record name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check every vault file against the signed manifest
    Verify,

    /// Copy the vault to another directory
    Export {
        /// Destination directory
        dst: PathBuf,
    },

    /// Replace the vault with a verified copy from another directory
    Import {
        /// Source directory (a previous export)
        src: PathBuf,
        /// Check file digests only; skip the manifest HMAC and the password
        #[arg(long)]
        no_hmac: bool,
        /// Replace an existing vault without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Change the vault's password
    Passwd,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault password, trying in order:
/// 1. `STRONGBOX_PASSWORD` env var (CI/CD)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter vault password")
        .interact()
        .map_err(|e| StrongboxError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used by `init` and `passwd`).
///
/// Also respects `STRONGBOX_PASSWORD` for scripted/CI usage.
/// Enforces a minimum password length.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        check_password_len(&pw)?;
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault password")
                .with_confirmation(
                    "Confirm vault password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| StrongboxError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if check_password_len(&password).is_err() {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn check_password_len(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(StrongboxError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Load `.strongbox.toml` from the working directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the vault root: `--vault-dir` wins over the config file.
///
/// Example: `<cwd>/.strongbox`
pub fn vault_root(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.vault_dir {
        Some(dir) => cwd.join(dir),
        None => settings.vault_root(&cwd),
    })
}

/// A locked manager for the vault selected by the CLI arguments.
pub fn open_manager(cli: &Cli) -> Result<VaultManager> {
    let settings = load_settings()?;
    let root = vault_root(cli, &settings)?;
    Ok(VaultManager::new(FsStorage::new(), root, &settings))
}

/// Open the selected vault, prompting for the password.
///
/// A non-`Ok` integrity report only gets this far under the `warn`
/// policy; it is shown to the user before continuing.
pub fn unlock_vault(cli: &Cli) -> Result<VaultManager> {
    let mut manager = open_manager(cli)?;
    require_vault(&manager)?;

    let password = prompt_password()?;
    let report = manager.unlock(&password)?;
    if !report.is_ok() {
        output::print_integrity_report(&report);
    }
    Ok(manager)
}

/// Fail with a hint when there is no vault at the selected root.
pub fn require_vault(manager: &VaultManager) -> Result<()> {
    if manager.is_initialized() {
        return Ok(());
    }
    output::tip("Run `strongbox init` to create a vault.");
    Err(StrongboxError::NotFound(format!(
        "vault at {}",
        manager.layout().root().display()
    )))
}
