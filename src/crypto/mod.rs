//! Cryptographic primitives for PassVault.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 master-password key derivation (`kdf`)
//! - The zeroizing in-memory `SessionKey` (`keys`)
//! - AES-128-GCM encryption and decryption of text secrets (`encryption`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, CipherText};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, KdfParams, SALT_LEN};
pub use keys::SessionKey;
