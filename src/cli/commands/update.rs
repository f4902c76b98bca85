//! `passvault update` — replace username and password of a credential.

use crate::cli::output;
use crate::cli::{read_secret, read_text, unlock, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `update` command.
pub fn execute(cli: &Cli, account: &str, username: Option<&str>) -> Result<()> {
    let mut controller = unlock(cli, false)?;
    let mut session = controller.session()?;

    let existing = session
        .find(account)
        .ok_or_else(|| PassVaultError::AccountNotFound(account.trim().to_string()))?;

    let username = match username {
        Some(u) => u.to_string(),
        None => read_text("New username", Some(existing.username()))?,
    };
    let secret = read_secret(None, &format!("New password for {}", existing.account_name()))?;

    if !session.update(account, &username, &secret)? {
        return Err(PassVaultError::AccountNotFound(account.trim().to_string()));
    }
    session.save()?;

    output::success(&format!("Credential '{}' updated", existing.account_name()));

    Ok(())
}
