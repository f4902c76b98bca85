//! `passvault menu` — the interactive menu.
//!
//! Unlocks (or, on first run, provisions) the vault, then loops over
//! add / view / remove / search / update until the user exits.  Every
//! change is saved before returning to the menu.

use dialoguer::Select;

use crate::cli::commands::list::rows;
use crate::cli::output::{self, CredentialRow};
use crate::cli::{read_secret, read_text, unlock, Cli};
use crate::errors::{PassVaultError, Result};
use crate::unlock::Session;

const ITEMS: &[&str] = &[
    "Add password",
    "View passwords",
    "Remove password",
    "Search account",
    "Update entry",
    "Exit",
];

/// Execute the `menu` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut controller = unlock(cli, true)?;
    let mut session = controller.session()?;
    output::success("Access granted.");

    loop {
        let choice = Select::new()
            .with_prompt("Password Manager")
            .items(ITEMS)
            .default(0)
            .interact_opt()
            .map_err(|e| PassVaultError::CommandFailed(format!("menu prompt: {e}")))?;

        let outcome = match choice {
            Some(0) => add(&mut session),
            Some(1) => {
                output::print_credentials_table(&rows(&session, true));
                Ok(())
            }
            Some(2) => remove(&mut session),
            Some(3) => search(&session),
            Some(4) => update(&mut session),
            _ => return Ok(()),
        };

        // Expected failures are reported and the menu keeps running;
        // a failed save aborts.
        match outcome {
            Err(e @ (PassVaultError::WriteFailed { .. } | PassVaultError::Io(_))) => return Err(e),
            Err(e) => output::error(&e.to_string()),
            Ok(()) => {}
        }
    }
}

fn add(session: &mut Session<'_>) -> Result<()> {
    let account = read_text("Account name", None)?;
    if session.contains(&account) {
        return Err(PassVaultError::DuplicateAccount(account));
    }

    let username = read_text("Username", None)?;
    let secret = read_secret(None, "Password")?;
    session.add(&account, &username, &secret)?;
    session.save()?;

    output::success(&format!("Credential '{account}' added."));
    Ok(())
}

fn remove(session: &mut Session<'_>) -> Result<()> {
    let account = read_text("Account name to remove", None)?;
    if !session.remove(&account) {
        return Err(PassVaultError::AccountNotFound(account));
    }
    session.save()?;

    output::success("Password removed successfully.");
    Ok(())
}

fn search(session: &Session<'_>) -> Result<()> {
    let account = read_text("Account name", None)?;
    let record = session
        .find(&account)
        .ok_or(PassVaultError::AccountNotFound(account))?;

    let password = session.reveal(&record).unwrap_or_else(|e| {
        tracing::warn!(account = record.account_name(), error = %e, "entry failed to decrypt");
        output::CORRUPTED.to_string()
    });

    output::print_credentials_table(&[CredentialRow {
        account: record.account_name().to_string(),
        username: record.username().to_string(),
        password,
    }]);
    Ok(())
}

fn update(session: &mut Session<'_>) -> Result<()> {
    let account = read_text("Account name", None)?;
    let existing = session
        .find(&account)
        .ok_or_else(|| PassVaultError::AccountNotFound(account.clone()))?;

    let username = read_text("New username", Some(existing.username()))?;
    let secret = read_secret(None, "New password")?;
    session.update(&account, &username, &secret)?;
    session.save()?;

    output::success("Account updated!");
    Ok(())
}
