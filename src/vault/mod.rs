//! Vault module — credential storage.
//!
//! This module provides:
//! - `CredentialRecord` and `VaultState` types (`record`)
//! - Binary vault file format with atomic writes (`format`)
//! - In-memory `VaultStore` with case-insensitive CRUD (`store`)

pub mod format;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use format::VaultFile;
pub use record::{CredentialRecord, VaultState};
pub use store::VaultStore;
