// DidRegistry - vault addresses presented as DIDs, plus the selection pointer
//
// Nothing is cached: every query walks the vault, so a listing always
// reflects the latest create/import/delete.

use crate::identity::{Address, EthrDid, SeedPhrase};
use crate::vault::{KeyVault, VaultError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown DID: {0}")]
    UnknownDid(String),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// One identity as seen by callers. `seed` is only filled in by an
/// explicit reveal, never by a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DidRecord {
    pub did: EthrDid,
    pub address: Address,
    pub seed: Option<SeedPhrase>,
    pub is_selected: bool,
}

impl DidRecord {
    pub fn new(address: Address, is_selected: bool) -> Self {
        Self {
            did: EthrDid::from_address(address),
            address,
            seed: None,
            is_selected,
        }
    }
}

pub struct DidRegistry {
    vault: Arc<dyn KeyVault>,
    selected: RwLock<Option<EthrDid>>,
}

impl DidRegistry {
    /// Create a registry with nothing selected
    pub fn new(vault: Arc<dyn KeyVault>) -> Self {
        Self {
            vault,
            selected: RwLock::new(None),
        }
    }

    /// All identities, with the selected one flagged
    pub async fn list(&self) -> Result<Vec<DidRecord>, RegistryError> {
        let addresses = self.vault.list_addresses().await?;
        let selected = *self.selected.read().await;

        Ok(addresses
            .into_iter()
            .map(|address| {
                let is_selected = selected.map(|did| did.address() == address).unwrap_or(false);
                DidRecord::new(address, is_selected)
            })
            .collect())
    }

    /// The selected identity, if it still exists
    pub async fn get_selected(&self) -> Result<Option<DidRecord>, RegistryError> {
        let Some(did) = *self.selected.read().await else {
            return Ok(None);
        };

        if self.vault.contains(&did.address()).await? {
            Ok(Some(DidRecord::new(did.address(), true)))
        } else {
            Ok(None)
        }
    }

    /// Reveal the seed behind `address` after `prompt` is confirmed. The only
    /// way a `DidRecord` carries its seed.
    pub async fn reveal(&self, address: &Address, prompt: &str) -> Result<DidRecord, RegistryError> {
        let seed = self.vault.reveal(address, prompt).await?;
        let is_selected = self
            .selected
            .read()
            .await
            .map(|did| did.address() == *address)
            .unwrap_or(false);

        let mut record = DidRecord::new(*address, is_selected);
        record.seed = Some(seed);
        Ok(record)
    }

    /// Raw selection pointer
    pub async fn selected_did(&self) -> Option<EthrDid> {
        *self.selected.read().await
    }

    /// Point the selection at `did`, which must exist in the vault
    pub async fn set_selected(&self, did: &EthrDid) -> Result<(), RegistryError> {
        if !self.vault.contains(&did.address()).await? {
            return Err(RegistryError::UnknownDid(did.to_string()));
        }

        *self.selected.write().await = Some(*did);
        debug!(%did, "selected identity changed");
        Ok(())
    }

    /// Clear the selection if it points at `address`. Returns whether it did.
    pub async fn clear_selected_if_matches(&self, address: &Address) -> bool {
        let mut selected = self.selected.write().await;
        match *selected {
            Some(did) if did.address() == *address => {
                *selected = None;
                debug!(%did, "selection cleared");
                true
            }
            _ => false,
        }
    }
}
