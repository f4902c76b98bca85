//! Credential records and the persisted vault snapshot.
//!
//! `CredentialRecord` is handed out by value: callers get owned copies
//! and can only change a stored record through `VaultStore`.

use crate::crypto::{CipherText, KdfParams, SALT_LEN};

/// One stored account / username / secret triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    account_name: String,
    username: String,
    encrypted_secret: CipherText,
}

impl CredentialRecord {
    pub(crate) fn new(account_name: String, username: String, encrypted_secret: CipherText) -> Self {
        Self {
            account_name,
            username,
            encrypted_secret,
        }
    }

    /// The account name, as originally cased when the record was added.
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The secret, encrypted under the session key that stored it.
    pub fn encrypted_secret(&self) -> &CipherText {
        &self.encrypted_secret
    }

    /// Replace username and secret.  The account name never changes.
    pub(crate) fn replace(&mut self, username: String, encrypted_secret: CipherText) {
        self.username = username;
        self.encrypted_secret = encrypted_secret;
    }
}

/// Everything a vault file holds, independent of how it is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    /// KDF parameters the session key was derived with.
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    /// The master password encrypted under its own derived key.
    pub verifier: CipherText,
    pub records: Vec<CredentialRecord>,
}
