// SeedVault - KeyVault over a SeedBackend and a Confirmer
//
// Locking: one RwLock guards the backend. Mutations take the write guard,
// lookups take the read guard. Confirmation prompts are always awaited with
// no guard held and before any write, so a declined, timed-out or dropped
// prompt leaves storage untouched. When both are needed the backend lock is
// taken before the `unlocked` set.

use crate::identity::{Address, SeedPhrase};
use crate::storage::{SeedBackend, SeedRecord};
use crate::vault::{
    Confirmer, KeyVault, ProtectionLevel, SigningHandle, SoftwareKey, VaultConfig, VaultError,
    SIGN_PROMPT, STORE_PROMPT,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub struct SeedVault {
    backend: RwLock<Box<dyn SeedBackend>>,
    confirmer: Arc<dyn Confirmer>,
    config: VaultConfig,
    /// SinglePrompt addresses confirmed during this session
    unlocked: Mutex<HashSet<Address>>,
}

impl SeedVault {
    pub fn new(
        backend: Box<dyn SeedBackend>,
        confirmer: Arc<dyn Confirmer>,
        config: VaultConfig,
    ) -> Result<Self, VaultError> {
        config.validate()?;
        Ok(Self {
            backend: RwLock::new(backend),
            confirmer,
            config,
            unlocked: Mutex::new(HashSet::new()),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Wait for the user to approve `prompt`, bounded by the configured timeout
    async fn confirm(&self, prompt: &str) -> Result<(), VaultError> {
        let timeout = Duration::from_millis(self.config.confirm_timeout_ms);

        match tokio::time::timeout(timeout, self.confirmer.confirm(prompt)).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(prompt, "confirmation declined");
                Err(VaultError::UserDeclined)
            }
            Err(_) => {
                warn!(prompt, timeout_ms = self.config.confirm_timeout_ms, "confirmation timed out");
                Err(VaultError::Cancelled)
            }
        }
    }

    fn check_level(&self, level: ProtectionLevel) -> Result<(), VaultError> {
        if self.config.supports(level) {
            Ok(())
        } else {
            Err(VaultError::UnsupportedLevel(level))
        }
    }

    async fn load(&self, address: &Address) -> Result<SeedRecord, VaultError> {
        let backend = self.backend.read().await;
        backend
            .get(address)?
            .ok_or(VaultError::NotFound(*address))
    }

    /// Confirm if needed, then write the record unless its address is taken
    async fn store(&self, phrase: SeedPhrase, level: ProtectionLevel) -> Result<Address, VaultError> {
        let address = phrase.derive_address(&self.config.derivation_path)?;

        if self.backend.read().await.contains(&address)? {
            return Err(VaultError::AlreadyExists(address));
        }

        if level.confirms_on_store() {
            self.confirm(STORE_PROMPT).await?;
        }

        let record = SeedRecord::new(address, level, phrase, &self.config.derivation_path);

        let backend = self.backend.write().await;
        // Re-check under the write guard: another import may have won the race
        if backend.contains(&address)? {
            return Err(VaultError::AlreadyExists(address));
        }
        backend.put(&record)?;

        Ok(address)
    }
}

#[async_trait]
impl KeyVault for SeedVault {
    async fn create(&self, level: ProtectionLevel) -> Result<Address, VaultError> {
        self.check_level(level)?;

        let phrase = SeedPhrase::generate(self.config.word_count)?;
        let address = self.store(phrase, level).await?;

        info!(%address, %level, "seed created");
        Ok(address)
    }

    async fn import(&self, phrase: &str, level: ProtectionLevel) -> Result<Address, VaultError> {
        self.check_level(level)?;

        let phrase = SeedPhrase::parse(phrase)?;
        let address = self.store(phrase, level).await?;

        info!(%address, %level, "seed imported");
        Ok(address)
    }

    async fn delete(&self, address: &Address) -> Result<bool, VaultError> {
        let removed = {
            let backend = self.backend.write().await;
            let removed = backend.remove(address)?;
            // Still under the write guard: no handle can re-unlock in between
            self.unlocked.lock().await.remove(address);
            removed
        };

        if removed {
            info!(%address, "seed deleted");
        } else {
            debug!(%address, "delete requested for unknown address");
        }
        Ok(removed)
    }

    async fn list_addresses(&self) -> Result<Vec<Address>, VaultError> {
        let backend = self.backend.read().await;
        Ok(backend.addresses()?)
    }

    async fn reveal(&self, address: &Address, prompt: &str) -> Result<SeedPhrase, VaultError> {
        // Fail fast on unknown addresses without bothering the user
        self.load(address).await?;

        self.confirm(prompt).await?;

        // The record may have been deleted while the prompt was open
        let record = self.load(address).await?;
        info!(%address, "seed revealed");
        Ok(record.phrase().clone())
    }

    async fn signing_handle(&self, address: &Address) -> Result<SigningHandle, VaultError> {
        let record = self.load(address).await?;

        match record.protection_level() {
            ProtectionLevel::Simple | ProtectionLevel::CloudBacked => {}
            ProtectionLevel::SinglePrompt => {
                let unlocked = self.unlocked.lock().await.contains(address);
                if !unlocked {
                    self.confirm(SIGN_PROMPT).await?;
                    let backend = self.backend.read().await;
                    if !backend.contains(address)? {
                        return Err(VaultError::NotFound(*address));
                    }
                    self.unlocked.lock().await.insert(*address);
                }
            }
            ProtectionLevel::PromptEveryTime => {
                self.confirm(SIGN_PROMPT).await?;
                if !self.contains(address).await? {
                    return Err(VaultError::NotFound(*address));
                }
            }
        }

        let secret = record
            .phrase()
            .derive_secret_key(record.derivation_path())?;
        debug!(%address, "signing handle issued");
        Ok(SigningHandle::new(*address, Arc::new(SoftwareKey::new(secret))))
    }

    async fn contains(&self, address: &Address) -> Result<bool, VaultError> {
        let backend = self.backend.read().await;
        Ok(backend.contains(address)?)
    }
}
