//! Unlock controller — first-run provisioning and master-password
//! authentication.
//!
//! ```text
//! Start ─┬─ NotProvisioned ── Provisioning ──────────────── Unlocked
//!        └─ Provisioned ───── Authenticating ─┬─ (match) ── Unlocked
//!                                             └─ (N misses) Locked
//! ```
//!
//! The controller is the sole owner of the `SessionKey`.  Record
//! operations are reachable only through a `Session`, which borrows the
//! key and can only be obtained in the `Unlocked` state.

use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{KdfParams, SessionKey};
use crate::errors::{PassVaultError, Result};
use crate::vault::{CredentialRecord, VaultFile, VaultStore};

/// Where master passwords come from.
///
/// The CLI implements this with terminal prompts; tests use scripted
/// sequences.
pub trait PasswordSource {
    /// Ask for the master password of a brand-new vault.
    fn new_master_password(&mut self) -> Result<Zeroizing<String>>;

    /// Ask for a candidate master password.  `attempt` is 1-based.
    fn candidate_password(&mut self, attempt: u32, max_attempts: u32)
        -> Result<Zeroizing<String>>;

    /// Called after each rejected candidate.
    fn attempt_failed(&mut self, _attempts_left: u32) {}
}

/// Controller lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Start,
    NotProvisioned,
    Provisioning,
    Provisioned,
    Authenticating,
    Unlocked,
    /// Terminal: the attempt budget ran out.
    Locked,
}

pub struct UnlockController {
    file: VaultFile,
    store: VaultStore,
    state: ControllerState,
    session_key: Option<SessionKey>,
    kdf: KdfParams,
    max_attempts: u32,
}

impl UnlockController {
    /// Load the vault file and settle into `NotProvisioned` or `Provisioned`.
    pub fn open(file: VaultFile, settings: &Settings) -> Result<Self> {
        let mut controller = Self {
            file,
            store: VaultStore::new(),
            state: ControllerState::Start,
            session_key: None,
            kdf: settings.kdf_params(),
            max_attempts: settings.max_unlock_attempts.max(1),
        };

        if let Some(state) = controller.file.load()? {
            controller.store = VaultStore::from_state(state);
        }

        controller.state = if controller.store.is_provisioned() {
            ControllerState::Provisioned
        } else {
            ControllerState::NotProvisioned
        };
        Ok(controller)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_provisioned(&self) -> bool {
        self.store.is_provisioned()
    }

    pub fn file(&self) -> &VaultFile {
        &self.file
    }

    /// Drive the state machine until it reaches `Unlocked` or `Locked`.
    ///
    /// A fresh vault is provisioned and persisted immediately.  An
    /// existing vault gets up to `max_unlock_attempts` candidates.
    /// Errors from the password source (e.g. a cancelled prompt) leave
    /// the controller where it was before this call.
    pub fn run<S>(&mut self, source: &mut S) -> Result<ControllerState>
    where
        S: PasswordSource + ?Sized,
    {
        match self.state {
            ControllerState::NotProvisioned => self.provision(source)?,
            ControllerState::Provisioned => self.authenticate(source)?,
            _ => {}
        }
        Ok(self.state)
    }

    fn provision<S>(&mut self, source: &mut S) -> Result<()>
    where
        S: PasswordSource + ?Sized,
    {
        self.state = ControllerState::Provisioning;

        let outcome = source.new_master_password().and_then(|password| {
            // Build into a scratch store so a failed save leaves us
            // unprovisioned rather than half set up.
            let mut store = VaultStore::new();
            let key = store.provision_with_params(&password, &self.kdf)?;
            self.file.save(&store.to_state()?)?;
            Ok((store, key))
        });

        match outcome {
            Ok((store, key)) => {
                self.store = store;
                self.session_key = Some(key);
                self.state = ControllerState::Unlocked;
                info!(path = %self.file.path().display(), "new vault provisioned");
                Ok(())
            }
            Err(e) => {
                self.state = ControllerState::NotProvisioned;
                Err(e)
            }
        }
    }

    fn authenticate<S>(&mut self, source: &mut S) -> Result<()>
    where
        S: PasswordSource + ?Sized,
    {
        self.state = ControllerState::Authenticating;

        for attempt in 1..=self.max_attempts {
            let candidate = match source.candidate_password(attempt, self.max_attempts) {
                Ok(c) => c,
                Err(e) => {
                    self.state = ControllerState::Provisioned;
                    return Err(e);
                }
            };

            match self.store.unlock(&candidate) {
                Ok(key) => {
                    self.session_key = Some(key);
                    self.state = ControllerState::Unlocked;
                    info!(attempt, "vault unlocked");
                    return Ok(());
                }
                Err(PassVaultError::AuthMismatch) => {
                    source.attempt_failed(self.max_attempts - attempt);
                }
                Err(e) => {
                    self.state = ControllerState::Provisioned;
                    return Err(e);
                }
            }
        }

        warn!(attempts = self.max_attempts, "vault locked after failed attempts");
        self.state = ControllerState::Locked;
        Ok(())
    }

    /// Borrow the unlocked vault for record operations.
    pub fn session(&mut self) -> Result<Session<'_>> {
        match (self.state, self.session_key.as_ref()) {
            (ControllerState::Unlocked, Some(key)) => Ok(Session {
                store: &mut self.store,
                key,
                file: &self.file,
            }),
            (ControllerState::NotProvisioned, _) => Err(PassVaultError::NotProvisioned),
            _ => Err(PassVaultError::VaultLocked),
        }
    }
}

/// Record operations on an unlocked vault.
///
/// Mutations stay in memory until `save` is called.
pub struct Session<'a> {
    store: &'a mut VaultStore,
    key: &'a SessionKey,
    file: &'a VaultFile,
}

impl Session<'_> {
    pub fn add(&mut self, account_name: &str, username: &str, secret: &str) -> Result<()> {
        self.store.add(account_name, username, secret, self.key)
    }

    pub fn remove(&mut self, account_name: &str) -> bool {
        self.store.remove(account_name)
    }

    pub fn update(&mut self, account_name: &str, username: &str, secret: &str) -> Result<bool> {
        self.store.update(account_name, username, secret, self.key)
    }

    pub fn find(&self, account_name: &str) -> Option<CredentialRecord> {
        self.store.find(account_name)
    }

    pub fn contains(&self, account_name: &str) -> bool {
        self.store.contains(account_name)
    }

    pub fn list(&self) -> Vec<CredentialRecord> {
        self.store.list()
    }

    /// Decrypt a record's secret with the session key.
    pub fn reveal(&self, record: &CredentialRecord) -> Result<String> {
        self.store.reveal(record, self.key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Persist the current state to the vault file.
    pub fn save(&self) -> Result<()> {
        self.file.save(&self.store.to_state()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::MIN_ITERATIONS;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    struct Scripted {
        passwords: VecDeque<&'static str>,
        asked: u32,
    }

    impl Scripted {
        fn new(passwords: &[&'static str]) -> Self {
            Self {
                passwords: passwords.iter().copied().collect(),
                asked: 0,
            }
        }

        fn next(&mut self) -> Result<Zeroizing<String>> {
            self.asked += 1;
            self.passwords
                .pop_front()
                .map(|p| Zeroizing::new(p.to_string()))
                .ok_or(PassVaultError::UserCancelled)
        }
    }

    impl PasswordSource for Scripted {
        fn new_master_password(&mut self) -> Result<Zeroizing<String>> {
            self.next()
        }

        fn candidate_password(&mut self, _: u32, _: u32) -> Result<Zeroizing<String>> {
            self.next()
        }
    }

    fn settings() -> Settings {
        Settings {
            kdf_iterations: MIN_ITERATIONS,
            ..Settings::default()
        }
    }

    #[test]
    fn cancelled_provisioning_stays_unprovisioned() {
        let dir = TempDir::new().unwrap();
        let file = VaultFile::new(dir.path().join("v.vault"));
        let mut ctl = UnlockController::open(file.clone(), &settings()).unwrap();

        let result = ctl.run(&mut Scripted::new(&[]));
        assert!(matches!(result, Err(PassVaultError::UserCancelled)));
        assert_eq!(ctl.state(), ControllerState::NotProvisioned);
        assert!(!file.exists());
        assert!(matches!(ctl.session(), Err(PassVaultError::NotProvisioned)));
    }

    #[test]
    fn cancelled_authentication_returns_to_provisioned() {
        let dir = TempDir::new().unwrap();
        let file = VaultFile::new(dir.path().join("v.vault"));
        UnlockController::open(file.clone(), &settings())
            .unwrap()
            .run(&mut Scripted::new(&["root123"]))
            .unwrap();

        let mut ctl = UnlockController::open(file, &settings()).unwrap();
        let result = ctl.run(&mut Scripted::new(&["wrong"]));
        assert!(matches!(result, Err(PassVaultError::UserCancelled)));
        assert_eq!(ctl.state(), ControllerState::Provisioned);
    }

    #[test]
    fn run_is_idempotent_once_unlocked() {
        let dir = TempDir::new().unwrap();
        let file = VaultFile::new(dir.path().join("v.vault"));
        let mut ctl = UnlockController::open(file, &settings()).unwrap();
        let mut source = Scripted::new(&["root123"]);

        assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Unlocked);
        assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Unlocked);
        assert_eq!(source.asked, 1);
    }

    #[test]
    fn attempt_budget_comes_from_settings() {
        let dir = TempDir::new().unwrap();
        let file = VaultFile::new(dir.path().join("v.vault"));
        UnlockController::open(file.clone(), &settings())
            .unwrap()
            .run(&mut Scripted::new(&["root123"]))
            .unwrap();

        let one_try = Settings {
            max_unlock_attempts: 1,
            ..settings()
        };
        let mut ctl = UnlockController::open(file, &one_try).unwrap();
        let mut source = Scripted::new(&["wrong", "root123"]);
        assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Locked);
        assert_eq!(source.asked, 1);
    }
}
