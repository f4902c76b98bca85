//! Integration tests for the unlock controller.

use std::collections::VecDeque;

use passvault::config::Settings;
use passvault::crypto::kdf::MIN_ITERATIONS;
use passvault::errors::{PassVaultError, Result};
use passvault::unlock::{ControllerState, PasswordSource, UnlockController};
use passvault::vault::VaultFile;
use tempfile::TempDir;
use zeroize::Zeroizing;

/// Supplies passwords from a fixed list and records what happened.
#[derive(Default)]
struct Scripted {
    passwords: VecDeque<String>,
    attempts_seen: Vec<(u32, u32)>,
    failures: Vec<u32>,
}

impl Scripted {
    fn new(passwords: &[&str]) -> Self {
        Self {
            passwords: passwords.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    fn next(&mut self) -> Result<Zeroizing<String>> {
        self.passwords
            .pop_front()
            .map(Zeroizing::new)
            .ok_or(PassVaultError::UserCancelled)
    }
}

impl PasswordSource for Scripted {
    fn new_master_password(&mut self) -> Result<Zeroizing<String>> {
        self.next()
    }

    fn candidate_password(&mut self, attempt: u32, max: u32) -> Result<Zeroizing<String>> {
        self.attempts_seen.push((attempt, max));
        self.next()
    }

    fn attempt_failed(&mut self, attempts_left: u32) {
        self.failures.push(attempts_left);
    }
}

fn settings() -> Settings {
    Settings {
        kdf_iterations: MIN_ITERATIONS,
        ..Settings::default()
    }
}

fn fresh() -> (TempDir, VaultFile) {
    let dir = TempDir::new().unwrap();
    let file = VaultFile::new(dir.path().join("passwords.vault"));
    (dir, file)
}

/// Provision a vault with `password` on disk.
fn provision(file: &VaultFile, password: &str) {
    let mut ctl = UnlockController::open(file.clone(), &settings()).unwrap();
    assert_eq!(ctl.state(), ControllerState::NotProvisioned);
    let state = ctl.run(&mut Scripted::new(&[password])).unwrap();
    assert_eq!(state, ControllerState::Unlocked);
}

#[test]
fn first_run_provisions_and_persists() {
    let (_dir, file) = fresh();
    assert!(!file.exists());

    provision(&file, "root123");

    assert!(file.exists());
    let loaded = file.load().unwrap().unwrap();
    assert!(loaded.records.is_empty());
    assert_eq!(loaded.kdf.iterations, MIN_ITERATIONS);
}

#[test]
fn correct_password_unlocks_on_first_try() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    let mut ctl = UnlockController::open(file, &settings()).unwrap();
    assert_eq!(ctl.state(), ControllerState::Provisioned);

    let mut source = Scripted::new(&["root123"]);
    assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Unlocked);
    assert_eq!(source.attempts_seen, vec![(1, 3)]);
    assert!(source.failures.is_empty());
}

#[test]
fn third_attempt_still_unlocks() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    let mut ctl = UnlockController::open(file, &settings()).unwrap();
    let mut source = Scripted::new(&["a", "b", "root123"]);
    assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Unlocked);
    assert_eq!(source.failures, vec![2, 1]);
}

#[test]
fn three_wrong_passwords_lock_the_vault() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    let mut ctl = UnlockController::open(file, &settings()).unwrap();
    let mut source = Scripted::new(&["wrong", "wrong", "wrong", "root123"]);

    assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Locked);
    assert_eq!(source.failures, vec![2, 1, 0]);
    // The fourth password is never asked for.
    assert_eq!(source.passwords.len(), 1);

    // Locked is terminal: no CRUD, and running again does not prompt.
    assert!(matches!(ctl.session(), Err(PassVaultError::VaultLocked)));
    assert_eq!(ctl.run(&mut source).unwrap(), ControllerState::Locked);
    assert_eq!(source.passwords.len(), 1);
}

#[test]
fn session_unavailable_before_unlock() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    let mut ctl = UnlockController::open(file, &settings()).unwrap();
    assert!(ctl.session().is_err());
}

#[test]
fn crud_through_session_survives_reopen() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    {
        let mut ctl = UnlockController::open(file.clone(), &settings()).unwrap();
        ctl.run(&mut Scripted::new(&["root123"])).unwrap();
        let mut session = ctl.session().unwrap();
        session.add("Gmail", "alice", "hunter2").unwrap();
        session.add("GitHub", "coder", "abc123").unwrap();
        assert!(matches!(
            session.add("gmail", "x", "y"),
            Err(PassVaultError::DuplicateAccount(_))
        ));
        assert!(session.update("github", "coder2", "def456").unwrap());
        assert!(session.remove("GITHUB"));
        session.save().unwrap();
    }

    let mut ctl = UnlockController::open(file, &settings()).unwrap();
    ctl.run(&mut Scripted::new(&["root123"])).unwrap();
    let session = ctl.session().unwrap();

    assert_eq!(session.len(), 1);
    assert!(session.find("github").is_none());
    assert!(session.contains(" GMAIL"));
    assert!(!session.contains("github"));
    let record = session.find("gmail").unwrap();
    assert_eq!(record.username(), "alice");
    assert_eq!(session.reveal(&record).unwrap(), "hunter2");
}

#[test]
fn unsaved_changes_are_not_persisted() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    {
        let mut ctl = UnlockController::open(file.clone(), &settings()).unwrap();
        ctl.run(&mut Scripted::new(&["root123"])).unwrap();
        ctl.session().unwrap().add("Gmail", "alice", "hunter2").unwrap();
    }

    assert!(file.load().unwrap().unwrap().records.is_empty());
}

#[test]
fn kdf_iterations_come_from_the_file_not_settings() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    // Changing the configured count must not break existing vaults.
    let changed = Settings {
        kdf_iterations: MIN_ITERATIONS * 2,
        ..settings()
    };
    let mut ctl = UnlockController::open(file, &changed).unwrap();
    let state = ctl.run(&mut Scripted::new(&["root123"])).unwrap();
    assert_eq!(state, ControllerState::Unlocked);
}

#[test]
fn corrupt_file_fails_to_open() {
    let (_dir, file) = fresh();
    std::fs::write(file.path(), b"PVLT\x01garbage").unwrap();
    assert!(matches!(
        UnlockController::open(file, &settings()),
        Err(PassVaultError::CorruptVault(_))
    ));
}

#[test]
fn header_with_zero_iterations_is_corrupt() {
    let (_dir, file) = fresh();
    provision(&file, "root123");

    // Rewrite the header JSON with a zero iteration count.
    let bytes = std::fs::read(file.path()).unwrap();
    let header_len = u32::from_le_bytes(bytes[5..9].try_into().unwrap()) as usize;
    let mut header: serde_json::Value = serde_json::from_slice(&bytes[9..9 + header_len]).unwrap();
    header["kdf_iterations"] = 0.into();
    let header_bytes = serde_json::to_vec(&header).unwrap();

    let mut rewritten = bytes[..5].to_vec();
    rewritten.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    rewritten.extend_from_slice(&header_bytes);
    rewritten.extend_from_slice(&bytes[9 + header_len..]);
    std::fs::write(file.path(), rewritten).unwrap();

    assert!(matches!(
        UnlockController::open(file, &settings()),
        Err(PassVaultError::CorruptVault(_))
    ));
}
