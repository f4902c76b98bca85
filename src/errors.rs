use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PassVault.
#[derive(Debug, Error)]
pub enum PassVaultError {
    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted entry")]
    DecryptionFailed,

    #[error("Invalid ciphertext encoding: {0}")]
    InvalidCipherText(String),

    // --- Authentication errors ---
    #[error("Incorrect master password")]
    AuthMismatch,

    #[error("Vault is locked — too many failed unlock attempts")]
    VaultLocked,

    #[error("Vault has no master password yet — run `passvault init`")]
    NotProvisioned,

    #[error("Vault already has a master password")]
    AlreadyProvisioned,

    // --- Record errors ---
    #[error("Account '{0}' already exists")]
    DuplicateAccount(String),

    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    // --- Persistence errors ---
    #[error("Vault file is corrupt: {0}")]
    CorruptVault(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Failed to write vault to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,
}

/// Convenience type alias for PassVault results.
pub type Result<T> = std::result::Result<T, PassVaultError>;
