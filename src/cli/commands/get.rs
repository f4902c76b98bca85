//! `passvault get` — show one credential, including its password.

use crate::cli::output::{self, CredentialRow};
use crate::cli::{unlock, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `get` command.
pub fn execute(cli: &Cli, account: &str) -> Result<()> {
    let mut controller = unlock(cli, false)?;
    let session = controller.session()?;

    let record = session
        .find(account)
        .ok_or_else(|| PassVaultError::AccountNotFound(account.trim().to_string()))?;

    // A record that no longer decrypts is reported, not hidden.
    let password = session.reveal(&record)?;

    output::print_credentials_table(&[CredentialRow {
        account: record.account_name().to_string(),
        username: record.username().to_string(),
        password,
    }]);

    Ok(())
}
