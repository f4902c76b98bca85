use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{KdfParams, MAX_ITERATIONS, MIN_ITERATIONS};
use crate::errors::{PassVaultError, Result};

/// Local configuration, loaded from `.passvault.toml`.
///
/// Every field has a sensible default so PassVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Vault file path (relative paths resolve against the config directory).
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// PBKDF2 iteration count for newly provisioned vaults (default: 65 536).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Master-password attempts before the vault locks (default: 3).
    #[serde(default = "default_max_unlock_attempts")]
    pub max_unlock_attempts: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "passwords.vault".to_string()
}

fn default_kdf_iterations() -> u32 {
    65_536
}

fn default_max_unlock_attempts() -> u32 {
    3
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            kdf_iterations: default_kdf_iterations(),
            max_unlock_attempts: default_max_unlock_attempts(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for.
    const FILE_NAME: &'static str = ".passvault.toml";

    /// Load settings from `<dir>/.passvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If it exists but cannot be parsed or holds out-of-range values,
    /// an error is returned.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PassVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !self.kdf_params().in_range() {
            return Err(PassVaultError::ConfigError(format!(
                "kdf_iterations must be between {MIN_ITERATIONS} and {MAX_ITERATIONS} (got {})",
                self.kdf_iterations
            )));
        }
        if self.max_unlock_attempts < 1 {
            return Err(PassVaultError::ConfigError(
                "max_unlock_attempts must be at least 1".into(),
            ));
        }
        if self.vault_file.trim().is_empty() {
            return Err(PassVaultError::ConfigError(
                "vault_file cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the vault file path against `dir`.
    pub fn vault_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.vault_file)
    }

    /// Convert the KDF settings into crypto-layer params.
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            iterations: self.kdf_iterations,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_file, "passwords.vault");
        assert_eq!(s.kdf_iterations, 65_536);
        assert_eq!(s.max_unlock_attempts, 3);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "passwords.vault");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_file = "secrets/main.vault"
kdf_iterations = 200000
max_unlock_attempts = 5
"#;
        fs::write(tmp.path().join(".passvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "secrets/main.vault");
        assert_eq!(settings.kdf_iterations, 200_000);
        assert_eq!(settings.max_unlock_attempts, 5);
        assert_eq!(settings.kdf_params().iterations, 200_000);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "max_unlock_attempts = 1\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.max_unlock_attempts, 1);
        assert_eq!(settings.kdf_iterations, 65_536);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_weak_kdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "kdf_iterations = 1000\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_excessive_kdf() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "kdf_iterations = 4294967295\n").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(PassVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_zero_attempts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".passvault.toml"), "max_unlock_attempts = 0\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn vault_path_joins_relative_file() {
        let s = Settings::default();
        let path = s.vault_path(Path::new("/home/user"));
        assert_eq!(path, PathBuf::from("/home/user/passwords.vault"));
    }
}
