//! `passvault version` — display the version.

use console::style;

use crate::crypto::kdf::DEFAULT_ITERATIONS;
use crate::errors::Result;
use crate::vault::format::CURRENT_VERSION;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("passvault {current}");
    println!(
        "{}",
        style(format!(
            "vault format v{CURRENT_VERSION}, PBKDF2-HMAC-SHA256 ({DEFAULT_ITERATIONS} rounds), AES-128-GCM"
        ))
        .dim()
    );
    Ok(())
}
