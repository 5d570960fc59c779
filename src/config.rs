// Top-level configuration for an identity service

use crate::jwt::SignerConfig;
use crate::vault::{ProtectionLevel, VaultConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Directory of the sled database; `None` keeps seeds in memory only
    pub data_dir: Option<PathBuf>,
    /// Level used by `create_default_identity`
    pub default_level: ProtectionLevel,
    pub vault: VaultConfig,
    pub signer: SignerConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_default_level(mut self, level: ProtectionLevel) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_vault(mut self, vault: VaultConfig) -> Self {
        self.vault = vault;
        self
    }

    pub fn with_signer(mut self, signer: SignerConfig) -> Self {
        self.signer = signer;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vault
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if !self.vault.supports(self.default_level) {
            return Err(ConfigError::Invalid(format!(
                "default level '{}' is not in the supported set",
                self.default_level
            )));
        }

        if self.signer.expires_in_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "expires_in_secs must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
