// KeyVault - the custody interface for seed material
// Nothing outside an implementation of this trait reads or writes key bytes

use crate::identity::{parse_derivation_path, Address, SeedError, SeedPhrase, DEFAULT_DERIVATION_PATH};
use crate::storage::StoreError;
use crate::vault::{ProtectionLevel, SigningHandle};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("No seed stored for address {0}")]
    NotFound(Address),

    #[error("A seed for address {0} already exists")]
    AlreadyExists(Address),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Protection level '{0}' is not supported on this platform")]
    UnsupportedLevel(ProtectionLevel),

    #[error("User declined the confirmation")]
    UserDeclined,

    #[error("Confirmation was cancelled")]
    Cancelled,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Invalid vault configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<SeedError> for VaultError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::InvalidPhrase(msg) => VaultError::InvalidSeed(msg),
            SeedError::DerivationFailed(msg) => VaultError::Derivation(msg),
            other => VaultError::InvalidConfig(other.to_string()),
        }
    }
}

/// Custodian of seed material
#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Generate and store a fresh seed, returning its address
    async fn create(&self, level: ProtectionLevel) -> Result<Address, VaultError>;

    /// Validate and store an existing seed phrase
    async fn import(&self, phrase: &str, level: ProtectionLevel) -> Result<Address, VaultError>;

    /// Remove a seed. Returns false if nothing was stored for the address.
    async fn delete(&self, address: &Address) -> Result<bool, VaultError>;

    /// Every stored address, once each
    async fn list_addresses(&self) -> Result<Vec<Address>, VaultError>;

    /// Return the seed phrase after the user confirms `prompt`
    async fn reveal(&self, address: &Address, prompt: &str) -> Result<SeedPhrase, VaultError>;

    /// Obtain a signing capability for an address
    async fn signing_handle(&self, address: &Address) -> Result<SigningHandle, VaultError>;

    async fn contains(&self, address: &Address) -> Result<bool, VaultError> {
        Ok(self.list_addresses().await?.contains(address))
    }
}

// ============================================================================
// VAULT CONFIG
// ============================================================================

/// Configuration for [`SeedVault`](crate::vault::SeedVault)
#[derive(Clone, Debug)]
pub struct VaultConfig {
    /// Protection levels this platform can provide
    pub supported_levels: HashSet<ProtectionLevel>,
    /// Words in newly generated phrases (12 or 24)
    pub word_count: usize,
    /// BIP-32 path keys are derived along
    pub derivation_path: String,
    /// How long to wait for a confirmation before cancelling, in milliseconds
    pub confirm_timeout_ms: u64,
}

impl VaultConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow cloud-backed seeds
    pub fn with_cloud_backup(mut self) -> Self {
        self.supported_levels.insert(ProtectionLevel::CloudBacked);
        self
    }

    /// Replace the set of supported levels
    pub fn with_supported_levels(mut self, levels: &[ProtectionLevel]) -> Self {
        self.supported_levels = levels.iter().copied().collect();
        self
    }

    pub fn with_word_count(mut self, words: usize) -> Self {
        self.word_count = words;
        self
    }

    pub fn with_derivation_path(mut self, path: &str) -> Self {
        self.derivation_path = path.to_string();
        self
    }

    pub fn with_confirm_timeout_ms(mut self, ms: u64) -> Self {
        self.confirm_timeout_ms = ms;
        self
    }

    pub fn supports(&self, level: ProtectionLevel) -> bool {
        self.supported_levels.contains(&level)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.confirm_timeout_ms == 0 {
            return Err(VaultError::InvalidConfig(
                "confirm_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.word_count != 12 && self.word_count != 24 {
            return Err(VaultError::InvalidConfig(format!(
                "word_count must be 12 or 24, got {}",
                self.word_count
            )));
        }
        if self.supported_levels.is_empty() {
            return Err(VaultError::InvalidConfig(
                "at least one protection level must be supported".to_string(),
            ));
        }
        parse_derivation_path(&self.derivation_path)
            .map_err(|e| VaultError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            supported_levels: [
                ProtectionLevel::Simple,
                ProtectionLevel::SinglePrompt,
                ProtectionLevel::PromptEveryTime,
            ]
            .into_iter()
            .collect(),
            word_count: 12,
            derivation_path: DEFAULT_DERIVATION_PATH.to_string(),
            confirm_timeout_ms: 60_000,
        }
    }
}
