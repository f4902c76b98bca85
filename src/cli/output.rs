//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

/// Placeholder shown instead of a password that is not revealed.
pub const MASK: &str = "••••••••";

/// Placeholder shown for a secret that failed to decrypt.
pub const CORRUPTED: &str = "<entry corrupted>";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// One displayable row: account, username, password (or placeholder).
pub struct CredentialRow {
    pub account: String,
    pub username: String,
    pub password: String,
}

/// Print a table of credentials (Account, Username, Password).
pub fn print_credentials_table(rows: &[CredentialRow]) {
    if rows.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `passvault add <ACCOUNT>` to add your first one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Account", "Username", "Password"]);

    for row in rows {
        table.add_row(vec![
            row.account.clone(),
            row.username.clone(),
            row.password.clone(),
        ]);
    }

    println!("{table}");
}
