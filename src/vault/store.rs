//! In-memory credential store.
//!
//! `VaultStore` owns the master verifier, the salt, and the record set.
//! It never holds the session key: every call that encrypts or decrypts
//! takes the key explicitly, and the caller (the unlock controller) is
//! the only owner of it.
//!
//! Account names match case-insensitively everywhere, including the
//! duplicate check in `add`.

use std::collections::HashMap;

use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::crypto::{self, decrypt, encrypt, CipherText, KdfParams, SessionKey, SALT_LEN};
use crate::errors::{PassVaultError, Result};

use super::record::{CredentialRecord, VaultState};

/// Salt, KDF parameters and verifier, present once provisioned.
#[derive(Debug, Clone)]
struct MasterHeader {
    kdf: KdfParams,
    salt: [u8; SALT_LEN],
    verifier: CipherText,
}

/// The vault's in-memory state.
#[derive(Debug, Default)]
pub struct VaultStore {
    master: Option<MasterHeader>,

    /// Lower-cased account name -> record.
    records: HashMap<String, CredentialRecord>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// An empty, unprovisioned store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a loaded snapshot.
    pub fn from_state(state: VaultState) -> Self {
        let records = state
            .records
            .into_iter()
            .map(|r| (fold(r.account_name()), r))
            .collect();

        Self {
            master: Some(MasterHeader {
                kdf: state.kdf,
                salt: state.salt,
                verifier: state.verifier,
            }),
            records,
        }
    }

    /// Snapshot the store for persistence, records sorted by name.
    pub fn to_state(&self) -> Result<VaultState> {
        let master = self.master.as_ref().ok_or(PassVaultError::NotProvisioned)?;
        Ok(VaultState {
            kdf: master.kdf,
            salt: master.salt,
            verifier: master.verifier.clone(),
            records: self.list(),
        })
    }

    // ------------------------------------------------------------------
    // Master password
    // ------------------------------------------------------------------

    /// True iff a master verifier is present.
    pub fn is_provisioned(&self) -> bool {
        self.master.is_some()
    }

    /// Set up a brand-new master password with the default KDF parameters.
    pub fn provision(&mut self, master_password: &str) -> Result<SessionKey> {
        self.provision_with_params(master_password, &KdfParams::default())
    }

    /// Set up a brand-new master password.
    ///
    /// Generates a fresh salt, derives the session key, stores the
    /// password encrypted under that key as the verifier, and starts
    /// with an empty record set.  Refuses to run on a provisioned vault
    /// because doing so would orphan every stored secret.
    pub fn provision_with_params(
        &mut self,
        master_password: &str,
        params: &KdfParams,
    ) -> Result<SessionKey> {
        if self.is_provisioned() {
            return Err(PassVaultError::AlreadyProvisioned);
        }

        let salt = crypto::generate_salt();
        let key = crypto::derive_key_with_params(master_password, &salt, params)?;
        let verifier = encrypt(master_password, &key)?;

        self.master = Some(MasterHeader {
            kdf: *params,
            salt,
            verifier,
        });
        self.records.clear();

        info!(iterations = params.iterations, "vault provisioned");
        Ok(key)
    }

    /// Check a candidate master password.
    ///
    /// Derives a key from the candidate and the stored salt, decrypts the
    /// verifier with it, and compares the result to the candidate in
    /// constant time.  A key that cannot open the verifier is a mismatch.
    /// Never mutates the store.
    pub fn unlock(&self, candidate_password: &str) -> Result<SessionKey> {
        let master = self.master.as_ref().ok_or(PassVaultError::NotProvisioned)?;

        let key = crypto::derive_key_with_params(candidate_password, &master.salt, &master.kdf)?;

        let stored = match decrypt(&master.verifier, &key) {
            Ok(plain) => zeroize::Zeroizing::new(plain),
            Err(PassVaultError::DecryptionFailed) => {
                warn!("unlock rejected");
                return Err(PassVaultError::AuthMismatch);
            }
            Err(e) => return Err(e),
        };

        if stored.as_bytes().ct_eq(candidate_password.as_bytes()).into() {
            debug!("unlock accepted");
            Ok(key)
        } else {
            warn!("unlock rejected");
            Err(PassVaultError::AuthMismatch)
        }
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Insert a new record, encrypting `plaintext_secret` with `key`.
    ///
    /// Fails with `DuplicateAccount` if any case variant of the name is
    /// already stored; the existing record is left as it was.
    pub fn add(
        &mut self,
        account_name: &str,
        username: &str,
        plaintext_secret: &str,
        key: &SessionKey,
    ) -> Result<()> {
        let account_name = validate_account_name(account_name)?;
        let folded = fold(account_name);
        if self.records.contains_key(&folded) {
            return Err(PassVaultError::DuplicateAccount(account_name.to_string()));
        }

        let encrypted_secret = encrypt(plaintext_secret, key)?;
        self.records.insert(
            folded,
            CredentialRecord::new(
                account_name.to_string(),
                username.to_string(),
                encrypted_secret,
            ),
        );

        debug!(account = account_name, "record added");
        Ok(())
    }

    /// Delete a record.  Returns `true` iff one existed.
    pub fn remove(&mut self, account_name: &str) -> bool {
        let removed = self.records.remove(&fold(account_name.trim())).is_some();
        if removed {
            debug!(account = account_name.trim(), "record removed");
        }
        removed
    }

    /// Replace username and secret of an existing record.
    ///
    /// Returns `Ok(false)` and changes nothing when the account does not
    /// exist.  The stored account name keeps its original casing.
    pub fn update(
        &mut self,
        account_name: &str,
        new_username: &str,
        new_plaintext_secret: &str,
        key: &SessionKey,
    ) -> Result<bool> {
        let Some(record) = self.records.get_mut(&fold(account_name.trim())) else {
            return Ok(false);
        };

        let encrypted_secret = encrypt(new_plaintext_secret, key)?;
        record.replace(new_username.to_string(), encrypted_secret);

        debug!(account = record.account_name(), "record updated");
        Ok(true)
    }

    /// Look up a record by name, ignoring case.
    pub fn find(&self, account_name: &str) -> Option<CredentialRecord> {
        self.records.get(&fold(account_name.trim())).cloned()
    }

    /// Snapshot of every record, sorted case-insensitively by name.
    pub fn list(&self) -> Vec<CredentialRecord> {
        let mut keys: Vec<&String> = self.records.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|k| self.records.get(k).cloned())
            .collect()
    }

    /// Decrypt a record's secret with `key`.
    pub fn reveal(&self, record: &CredentialRecord, key: &SessionKey) -> Result<String> {
        decrypt(record.encrypted_secret(), key)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if a record with this name exists (any casing).
    pub fn contains(&self, account_name: &str) -> bool {
        self.records.contains_key(&fold(account_name.trim()))
    }

    pub fn salt(&self) -> Option<&[u8; SALT_LEN]> {
        self.master.as_ref().map(|m| &m.salt)
    }

    pub fn verifier(&self) -> Option<&CipherText> {
        self.master.as_ref().map(|m| &m.verifier)
    }
}

/// Case-folded lookup key for an account name.
fn fold(account_name: &str) -> String {
    account_name.to_lowercase()
}

/// Trim an account name and reject empty ones.
fn validate_account_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PassVaultError::CommandFailed(
            "account name cannot be empty".into(),
        ));
    }
    Ok(name)
}
