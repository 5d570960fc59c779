// IdentityService - the facade callers use
//
// Owns the cross-component invariants: a new identity is auto-selected when
// nothing is selected, and deleting the selected identity moves the selection
// to another remaining identity or clears it.
//
// The facade lock covers selection changes only. Vault calls that may prompt
// run outside it, so an open confirmation does not stall listings.

use crate::config::{Config, ConfigError};
use crate::identity::{Address, EthrDid, SeedPhrase};
use crate::jwt::{self, ClaimSigner, JwtError, SignerError, VerifiedJwt};
use crate::registry::{DidRecord, DidRegistry, RegistryError};
use crate::storage::{MemoryBackend, SeedBackend, SeedStore, StoreError};
use crate::vault::{Confirmer, KeyVault, ProtectionLevel, SeedVault, VaultError, SHOW_SEED_PROMPT};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        IdentityError::Vault(VaultError::Storage(err))
    }
}

/// Result of `list_identities`
#[derive(Clone, Debug, Default)]
pub struct IdentityList {
    pub identities: Vec<DidRecord>,
    pub selected: Option<DidRecord>,
}

pub struct IdentityService {
    vault: Arc<dyn KeyVault>,
    registry: DidRegistry,
    signer: ClaimSigner,
    default_level: ProtectionLevel,
    /// Serializes selection changes
    op_lock: Mutex<()>,
}

impl IdentityService {
    /// Compose a service over any vault implementation
    pub fn new(vault: Arc<dyn KeyVault>, config: &Config) -> Self {
        Self {
            registry: DidRegistry::new(vault.clone()),
            signer: ClaimSigner::new(vault.clone(), config.signer.clone()),
            vault,
            default_level: config.default_level,
            op_lock: Mutex::new(()),
        }
    }

    /// Build a `SeedVault`-backed service: sled when `data_dir` is set,
    /// memory otherwise.
    pub fn open(config: &Config, confirmer: Arc<dyn Confirmer>) -> Result<Self, IdentityError> {
        config.validate()?;

        let backend: Box<dyn SeedBackend> = match &config.data_dir {
            Some(dir) => Box::new(SeedStore::open(dir)?),
            None => Box::new(MemoryBackend::new()),
        };
        let vault = SeedVault::new(backend, confirmer, config.vault.clone())?;

        Ok(Self::new(Arc::new(vault), config))
    }

    /// All identities and the selected one
    pub async fn list_identities(&self) -> Result<IdentityList, IdentityError> {
        let _guard = self.op_lock.lock().await;

        Ok(IdentityList {
            identities: self.registry.list().await?,
            selected: self.registry.get_selected().await?,
        })
    }

    /// Create an identity at the configured default level
    pub async fn create_default_identity(&self) -> Result<DidRecord, IdentityError> {
        self.create_identity(self.default_level).await
    }

    pub async fn create_identity(&self, level: ProtectionLevel) -> Result<DidRecord, IdentityError> {
        let address = self.vault.create(level).await?;

        let _guard = self.op_lock.lock().await;
        let is_selected = self.select_if_none(&address).await?;

        let record = DidRecord::new(address, is_selected);
        info!(did = %record.did, "identity created");
        Ok(record)
    }

    pub async fn import_identity(
        &self,
        phrase: &str,
        level: ProtectionLevel,
    ) -> Result<DidRecord, IdentityError> {
        let address = self.vault.import(phrase, level).await?;

        let _guard = self.op_lock.lock().await;
        let is_selected = self.select_if_none(&address).await?;

        let record = DidRecord::new(address, is_selected);
        info!(did = %record.did, "identity imported");
        Ok(record)
    }

    /// Delete an identity. A missing address is `Ok(false)`, not an error.
    pub async fn delete_identity(&self, address: &Address) -> Result<bool, IdentityError> {
        let _guard = self.op_lock.lock().await;

        if !self.vault.delete(address).await? {
            return Ok(false);
        }

        if self.registry.clear_selected_if_matches(address).await {
            self.reselect_first().await;
        }

        info!(did = %EthrDid::from_address(*address), "identity deleted");
        Ok(true)
    }

    /// Make `did` the selected identity
    pub async fn select_identity(&self, did: &EthrDid) -> Result<(), IdentityError> {
        let _guard = self.op_lock.lock().await;
        self.registry.set_selected(did).await?;
        Ok(())
    }

    /// Reveal the seed phrase after the user confirms
    pub async fn reveal_seed(&self, address: &Address) -> Result<SeedPhrase, IdentityError> {
        Ok(self.vault.reveal(address, SHOW_SEED_PROMPT).await?)
    }

    /// Same gate as `reveal_seed`, returned as a `DidRecord` with `seed` set
    pub async fn reveal_identity(&self, address: &Address) -> Result<DidRecord, IdentityError> {
        Ok(self.registry.reveal(address, SHOW_SEED_PROMPT).await?)
    }

    /// Sign a self-issued claim as `address`
    pub async fn sign_claim(
        &self,
        address: &Address,
        claim: Map<String, Value>,
    ) -> Result<String, IdentityError> {
        Ok(self.signer.sign(address, claim).await?)
    }

    /// Sign a claim about another subject as `address`
    pub async fn sign_claim_about(
        &self,
        address: &Address,
        subject: &EthrDid,
        claim: Map<String, Value>,
    ) -> Result<String, IdentityError> {
        Ok(self.signer.sign_with_subject(address, subject, claim).await?)
    }

    /// Verify a token's signature against its issuer
    pub fn verify_claim(&self, token: &str) -> Result<VerifiedJwt, IdentityError> {
        Ok(jwt::verify(token)?)
    }

    /// Select `address` when nothing is selected. Returns whether it is now
    /// the selected identity.
    /// Caller holds `op_lock`.
    async fn select_if_none(&self, address: &Address) -> Result<bool, IdentityError> {
        if self.registry.selected_did().await.is_some() {
            return Ok(false);
        }
        // Deleted between the vault write and taking the lock
        if !self.vault.contains(address).await? {
            return Ok(false);
        }
        self.registry.set_selected(&EthrDid::from_address(*address)).await?;
        Ok(true)
    }

    /// Select the first remaining identity, if any. Failures are only logged
    /// since the delete that triggered this has already happened.
    async fn reselect_first(&self) {
        let next = match self.vault.list_addresses().await {
            Ok(addresses) => addresses.into_iter().next(),
            Err(e) => {
                warn!(error = %e, "could not list identities to reselect");
                return;
            }
        };

        if let Some(next) = next {
            let did = EthrDid::from_address(next);
            if let Err(e) = self.registry.set_selected(&did).await {
                warn!(%did, error = %e, "could not reselect identity");
            }
        }
    }
}
