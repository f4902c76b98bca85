//! `passvault list` — display all credentials in a table.

use crate::cli::output::{self, CredentialRow};
use crate::cli::{unlock, Cli};
use crate::errors::Result;
use crate::unlock::Session;

/// Execute the `list` command.
pub fn execute(cli: &Cli, show: bool) -> Result<()> {
    let mut controller = unlock(cli, false)?;
    let session = controller.session()?;

    let rows = rows(&session, show);
    output::info(&format!("{} credential(s)", rows.len()));
    output::print_credentials_table(&rows);

    Ok(())
}

/// Build display rows, decrypting passwords only when `show` is set.
///
/// An entry that fails to decrypt is shown as corrupted instead of
/// aborting the whole listing.
pub fn rows(session: &Session<'_>, show: bool) -> Vec<CredentialRow> {
    session
        .list()
        .into_iter()
        .map(|record| {
            let password = if show {
                match session.reveal(&record) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(account = record.account_name(), error = %e, "entry failed to decrypt");
                        output::CORRUPTED.to_string()
                    }
                }
            } else {
                output::MASK.to_string()
            };
            CredentialRow {
                account: record.account_name().to_string(),
                username: record.username().to_string(),
                password,
            }
        })
        .collect()
}
