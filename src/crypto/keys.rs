//! The in-memory session key.
//!
//! A `SessionKey` is produced by provisioning or by a successful unlock and
//! lives only for the process lifetime.  It is never serialized.

use std::fmt;

use zeroize::Zeroize;

/// Length of the session key in bytes (128 bits, for AES-128).
pub const KEY_LEN: usize = 16;

/// A wrapper around the 16-byte session key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SessionKey {
    bytes: [u8; KEY_LEN],
}

impl SessionKey {
    /// Create a new `SessionKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = SessionKey::new([0xAB; KEY_LEN]);
        let shown = format!("{key:?}");
        assert_eq!(shown, "SessionKey(<redacted>)");
    }
}
