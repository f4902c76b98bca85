//! `passvault add` — store a new credential.

use crate::cli::output;
use crate::cli::{read_secret, read_text, unlock, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    account: &str,
    username: Option<&str>,
    secret: Option<&str>,
) -> Result<()> {
    let mut controller = unlock(cli, false)?;
    let mut session = controller.session()?;

    // Check before prompting so the user does not type a password for nothing.
    if session.contains(account) {
        return Err(PassVaultError::DuplicateAccount(account.trim().to_string()));
    }

    let username = match username {
        Some(u) => u.to_string(),
        None => read_text("Username", None)?,
    };
    let secret = read_secret(secret, &format!("Password for {account}"))?;

    session.add(account, &username, &secret)?;
    session.save()?;

    output::success(&format!(
        "Credential '{}' added ({} total)",
        account.trim(),
        session.len()
    ));

    Ok(())
}
