//! AES-128-GCM authenticated encryption of text secrets.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of a `CipherText` payload:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The printable form (`Display`, `to_base64`) is standard base64 of
//! that payload.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes128Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use super::keys::SessionKey;
use crate::errors::{PassVaultError, Result};

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// An encrypted secret: nonce followed by ciphertext and tag.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherText(Vec<u8>);

impl CipherText {
    /// Wrap raw payload bytes (as read back from a vault file).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Printable base64 encoding of the payload.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Parse the printable encoding produced by `to_base64`.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        BASE64
            .decode(encoded.trim())
            .map(Self)
            .map_err(|e| PassVaultError::InvalidCipherText(e.to_string()))
    }
}

impl fmt::Display for CipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for CipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherText({} bytes)", self.0.len())
    }
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(plaintext: &str, key: &SessionKey) -> Result<CipherText> {
    let cipher = Aes128Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PassVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes128Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| PassVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(CipherText(output))
}

/// Decrypt a `CipherText` produced by `encrypt` with the same key.
///
/// A wrong key, a truncated payload, or any flipped bit fails the tag
/// check and yields `DecryptionFailed`.
pub fn decrypt(cipher_text: &CipherText, key: &SessionKey) -> Result<String> {
    if cipher_text.len() < NONCE_LEN + TAG_LEN {
        return Err(PassVaultError::DecryptionFailed);
    }

    let (nonce_bytes, body) = cipher_text.as_bytes().split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes128Gcm::new_from_slice(key.as_bytes()).map_err(|_| PassVaultError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(nonce, body)
        .map_err(|_| PassVaultError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        PassVaultError::DecryptionFailed
    })
}
