//! `passvault remove` — delete a credential from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{unlock, Cli};
use crate::errors::{PassVaultError, Result};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, account: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before removing.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove credential '{account}'?"))
            .default(false)
            .interact()
            .map_err(|e| PassVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let mut controller = unlock(cli, false)?;
    let mut session = controller.session()?;

    if !session.remove(account) {
        return Err(PassVaultError::AccountNotFound(account.trim().to_string()));
    }
    session.save()?;

    output::success(&format!("Removed credential '{}'", account.trim()));

    Ok(())
}
