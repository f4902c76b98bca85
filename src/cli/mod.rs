//! CLI module — Clap argument parser, prompts, output helpers, and
//! command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{PassVaultError, Result};
use crate::unlock::{ControllerState, PasswordSource, UnlockController};
use crate::vault::VaultFile;

/// Environment variable that supplies the master password non-interactively.
pub const PASSWORD_ENV: &str = "PASSVAULT_PASSWORD";

/// PassVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "passvault",
    about = "Local encrypted password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: from .passvault.toml, else ./passwords.vault)
    #[arg(long, global = true, env = "PASSVAULT_FILE")]
    pub vault: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault and set its master password
    Init,

    /// Add a credential
    Add {
        /// Account name (e.g. Gmail)
        account: String,
        /// Username for the account (omit for interactive prompt)
        #[arg(short, long)]
        username: Option<String>,
        /// Password to store (omit for interactive prompt)
        secret: Option<String>,
    },

    /// Show a credential, including its password
    Get {
        /// Account name (case-insensitive)
        account: String,
    },

    /// List all credentials
    List {
        /// Decrypt and show passwords
        #[arg(long)]
        show: bool,
    },

    /// Remove a credential
    Remove {
        /// Account name (case-insensitive)
        account: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Change the username and password of a credential
    Update {
        /// Account name (case-insensitive)
        account: String,
        /// New username (omit for interactive prompt)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Interactive menu
    Menu,

    /// Show version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Master passwords from `PASSVAULT_PASSWORD` or an interactive prompt.
pub struct TerminalPasswords;

impl TerminalPasswords {
    fn from_env() -> Option<Zeroizing<String>> {
        match std::env::var(PASSWORD_ENV) {
            Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
            _ => None,
        }
    }
}

impl PasswordSource for TerminalPasswords {
    fn new_master_password(&mut self) -> Result<Zeroizing<String>> {
        if let Some(pw) = Self::from_env() {
            return Ok(pw);
        }

        output::info("No master password found. Setting up a new master password.");
        loop {
            let password = dialoguer::Password::new()
                .with_prompt("Set your master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .allow_empty_password(true)
                .interact()
                .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?;

            if password.is_empty() {
                output::warning("Master password cannot be empty. Try again.");
                continue;
            }

            return Ok(Zeroizing::new(password));
        }
    }

    fn candidate_password(&mut self, attempt: u32, max_attempts: u32) -> Result<Zeroizing<String>> {
        if let Some(pw) = Self::from_env() {
            return Ok(pw);
        }

        let prompt = if attempt > 1 {
            format!("Enter master password ({attempt}/{max_attempts})")
        } else {
            "Enter master password".to_string()
        };
        let pw = dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("password prompt: {e}")))?;
        Ok(Zeroizing::new(pw))
    }

    fn attempt_failed(&mut self, attempts_left: u32) {
        output::error("Incorrect password. Access denied.");
        if attempts_left == 0 {
            output::error("Too many failed attempts.");
        }
    }
}

/// Resolve the vault file from `--vault` or the settings.
pub fn vault_file(cli: &Cli, settings: &Settings) -> Result<VaultFile> {
    let path = match &cli.vault {
        Some(p) => PathBuf::from(p),
        None => settings.vault_path(&std::env::current_dir()?),
    };
    Ok(VaultFile::new(path))
}

/// Load settings and the vault file, without unlocking.
pub fn open_controller(cli: &Cli) -> Result<UnlockController> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(&cwd)?;
    let file = vault_file(cli, &settings)?;
    UnlockController::open(file, &settings)
}

/// Drive the controller to `Unlocked`, provisioning a fresh vault first
/// if `allow_provision` is set.
pub fn unlock(cli: &Cli, allow_provision: bool) -> Result<UnlockController> {
    let mut controller = open_controller(cli)?;

    if !controller.is_provisioned() && !allow_provision {
        output::tip("Run `passvault init` to create a vault.");
        return Err(PassVaultError::NotProvisioned);
    }

    match controller.run(&mut TerminalPasswords)? {
        ControllerState::Unlocked => Ok(controller),
        _ => Err(PassVaultError::VaultLocked),
    }
}

/// Read a secret value from an inline argument, piped stdin, or a prompt.
pub fn read_secret(inline: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    use std::io::{self, IsTerminal, Read};

    if let Some(v) = inline {
        output::warning("Password provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(
            buf.trim_end_matches(['\r', '\n']).to_string(),
        ));
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Read a plain text value, offering `default` when given.
pub fn read_text(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = dialoguer::Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    input
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(|e| PassVaultError::CommandFailed(format!("input prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_username() {
        let cli = Cli::try_parse_from(["passvault", "add", "Gmail", "-u", "alice"]).unwrap();
        match cli.command {
            Commands::Add {
                account,
                username,
                secret,
            } => {
                assert_eq!(account, "Gmail");
                assert_eq!(username.as_deref(), Some("alice"));
                assert!(secret.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn vault_flag_overrides_settings() {
        let cli = Cli::try_parse_from(["passvault", "--vault", "/tmp/x.vault", "list"]).unwrap();
        let file = vault_file(&cli, &Settings::default()).unwrap();
        assert_eq!(file.path(), std::path::Path::new("/tmp/x.vault"));
    }
}
