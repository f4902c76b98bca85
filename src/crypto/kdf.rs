//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The session key is never stored.  Unlock reproduces it from the master
//! password and the salt kept in the vault header, so derivation must be
//! fully deterministic for a given (password, salt, iterations) triple.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

use super::keys::{SessionKey, KEY_LEN};
use crate::errors::{PassVaultError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 65_536;

/// Lowest iteration count we are willing to derive with.
pub const MIN_ITERATIONS: u32 = 10_000;

/// Highest iteration count we accept; anything above stalls unlock.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// PBKDF2 parameters.
///
/// Only the iteration count is tunable; the PRF (HMAC-SHA256) and the
/// output length (128 bits) are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Number of PBKDF2 rounds (default: 65 536).
    pub iterations: u32,
}

impl KdfParams {
    /// Whether the iteration count lies in `MIN_ITERATIONS..=MAX_ITERATIONS`.
    pub fn in_range(&self) -> bool {
        (MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations)
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 128-bit session key from a password and salt.
///
/// Uses the default parameters (65 536 iterations).
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> Result<SessionKey> {
    derive_key_with_params(password, salt, &KdfParams::default())
}

/// Derive a 128-bit session key with an explicit iteration count.
///
/// Rejects iteration counts outside `MIN_ITERATIONS..=MAX_ITERATIONS`.
pub fn derive_key_with_params(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<SessionKey> {
    if !params.in_range() {
        return Err(PassVaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be between {MIN_ITERATIONS} and {MAX_ITERATIONS} (got {})",
            params.iterations
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, params.iterations, &mut key)
        .map_err(|e| PassVaultError::KeyDerivationFailed(format!("PBKDF2 failed: {e}")))?;

    debug!(iterations = params.iterations, "derived session key");
    Ok(SessionKey::new(key))
}

/// Generate a cryptographically random 16-byte salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
