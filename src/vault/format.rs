//! Vault file format and atomic persistence.
//!
//! A `.vault` file has this layout:
//!
//! ```text
//! [PVLT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][records JSON]
//! ```
//!
//! - **Header JSON**: KDF iteration count, salt and master verifier.
//! - **Records JSON**: array of account / username / secret entries.
//!
//! Byte fields (salt, verifier, secrets) are base64 strings in JSON.
//! Anything that does not parse back into a valid `VaultState` is
//! reported as `CorruptVault`.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::record::{CredentialRecord, VaultState};
use crate::crypto::kdf::{MAX_ITERATIONS, MIN_ITERATIONS};
use crate::crypto::{CipherText, KdfParams, SALT_LEN};
use crate::errors::{PassVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"PVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

/// Vault-wide metadata stored after the prefix.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileHeader {
    kdf_iterations: u32,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    salt: Vec<u8>,

    #[serde(serialize_with = "cipher_encode", deserialize_with = "cipher_decode")]
    verifier: CipherText,
}

/// One credential as stored in the records section.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRecord {
    account_name: String,
    username: String,

    #[serde(serialize_with = "cipher_encode", deserialize_with = "cipher_decode")]
    secret: CipherText,
}

// ---------------------------------------------------------------------------
// VaultFile
// ---------------------------------------------------------------------------

/// A vault file on disk.
#[derive(Debug, Clone)]
pub struct VaultFile {
    path: PathBuf,
}

impl VaultFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the full vault state to disk **atomically**.
    ///
    /// 1. Encode the state into one buffer.
    /// 2. Write it to a temp file in the same directory and fsync.
    /// 3. Rename the temp file over the target path.
    ///
    /// A failure at any step leaves the previous file untouched.
    pub fn save(&self, state: &VaultState) -> Result<()> {
        let buf = encode(state)?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| self.write_failed(e))?;
        }

        // The temp file is in the same directory so rename stays on one
        // filesystem and is atomic.
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        if let Err(e) = write_private(&tmp_path, &buf) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.write_failed(e));
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.write_failed(e));
        }

        info!(
            path = %self.path.display(),
            records = state.records.len(),
            "vault saved"
        );
        Ok(())
    }

    /// Read the vault state back from disk.
    ///
    /// Returns `Ok(None)` when the file does not exist (a fresh vault).
    pub fn load(&self) -> Result<Option<VaultState>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no vault file, starting fresh");
                return Ok(None);
            }
            Err(e) => return Err(PassVaultError::Io(e)),
        };

        let state = decode(&data)?;
        debug!(
            path = %self.path.display(),
            records = state.records.len(),
            "vault loaded"
        );
        Ok(Some(state))
    }

    fn write_failed(&self, source: std::io::Error) -> PassVaultError {
        PassVaultError::WriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}

/// Create (or truncate) `path` with owner-only permissions and write `buf`.
fn write_private(path: &Path, buf: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(buf)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize a `VaultState` into the layout described above.
pub fn encode(state: &VaultState) -> Result<Vec<u8>> {
    let header = FileHeader {
        kdf_iterations: state.kdf.iterations,
        salt: state.salt.to_vec(),
        verifier: state.verifier.clone(),
    };
    let records: Vec<FileRecord> = state
        .records
        .iter()
        .map(|r| FileRecord {
            account_name: r.account_name().to_string(),
            username: r.username().to_string(),
            secret: r.encrypted_secret().clone(),
        })
        .collect();

    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| PassVaultError::SerializationError(format!("header: {e}")))?;
    let records_bytes = serde_json::to_vec(&records)
        .map_err(|e| PassVaultError::SerializationError(format!("records: {e}")))?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        PassVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len() + records_bytes.len());
    buf.extend_from_slice(MAGIC);
    buf.push(CURRENT_VERSION);
    buf.extend_from_slice(&header_len.to_le_bytes());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(&records_bytes);
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse the file bytes back into a `VaultState`.
pub fn decode(data: &[u8]) -> Result<VaultState> {
    if data.len() < PREFIX_LEN {
        return Err(corrupt("file too small to be a vault"));
    }
    if &data[0..4] != MAGIC {
        return Err(corrupt("missing PVLT magic bytes"));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(corrupt(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&data[5..PREFIX_LEN]);
    let header_len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|_| corrupt("header length exceeds platform address space"))?;
    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| corrupt("header length exceeds file size"))?;

    let header: FileHeader = serde_json::from_slice(&data[PREFIX_LEN..header_end])
        .map_err(|e| corrupt(format!("header JSON: {e}")))?;
    let records: Vec<FileRecord> = serde_json::from_slice(&data[header_end..])
        .map_err(|e| corrupt(format!("records JSON: {e}")))?;

    let kdf = KdfParams {
        iterations: header.kdf_iterations,
    };
    if !kdf.in_range() {
        return Err(corrupt(format!(
            "kdf iterations {} outside {MIN_ITERATIONS}..={MAX_ITERATIONS}",
            kdf.iterations
        )));
    }

    let salt: [u8; SALT_LEN] = header
        .salt
        .as_slice()
        .try_into()
        .map_err(|_| corrupt(format!("salt is {} bytes, expected {SALT_LEN}", header.salt.len())))?;

    if header.verifier.is_empty() {
        return Err(corrupt("empty master verifier"));
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.account_name.to_lowercase()) {
            return Err(corrupt(format!(
                "duplicate account '{}'",
                record.account_name
            )));
        }
        out.push(CredentialRecord::new(
            record.account_name,
            record.username,
            record.secret,
        ));
    }

    Ok(VaultState {
        kdf,
        salt,
        verifier: header.verifier,
        records: out,
    })
}

fn corrupt(msg: impl Into<String>) -> PassVaultError {
    PassVaultError::CorruptVault(msg.into())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded byte fields
// ---------------------------------------------------------------------------

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

fn cipher_encode<S>(data: &CipherText, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&data.to_base64())
}

fn cipher_decode<'de, D>(deserializer: D) -> std::result::Result<CipherText, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    CipherText::from_base64(&s).map_err(serde::de::Error::custom)
}
