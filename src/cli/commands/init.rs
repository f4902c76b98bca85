//! `passvault init` — create a new vault and set its master password.

use crate::cli::output;
use crate::cli::{open_controller, Cli, TerminalPasswords};
use crate::errors::{PassVaultError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut controller = open_controller(cli)?;

    // Provisioning a second time would orphan every stored credential.
    if controller.is_provisioned() {
        output::tip("Use `passvault add` to add credentials to the existing vault.");
        return Err(PassVaultError::AlreadyProvisioned);
    }

    controller.run(&mut TerminalPasswords)?;

    output::success(&format!(
        "Vault created at {}",
        controller.file().path().display()
    ));
    output::tip("Run `passvault add <ACCOUNT>` to store a credential.");
    output::tip("Run `passvault menu` for the interactive menu.");

    Ok(())
}
