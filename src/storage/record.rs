// SeedRecord - what the vault persists for each identity

use crate::identity::{Address, SeedPhrase};
use crate::storage::StoreError;
use crate::vault::ProtectionLevel;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// One stored seed. Immutable once written: the protection level and
/// derivation path are fixed at creation.
#[derive(Clone, Debug)]
pub struct SeedRecord {
    address: Address,
    protection_level: ProtectionLevel,
    phrase: SeedPhrase,
    derivation_path: String,
    created_at: i64,
}

/// Wire form of a record (postcard)
#[derive(Serialize, Deserialize)]
struct StoredSeed {
    address: [u8; 20],
    protection_level: ProtectionLevel,
    phrase: String,
    derivation_path: String,
    created_at: i64,
}

impl Drop for StoredSeed {
    fn drop(&mut self) {
        self.phrase.zeroize();
    }
}

impl SeedRecord {
    pub fn new(
        address: Address,
        protection_level: ProtectionLevel,
        phrase: SeedPhrase,
        derivation_path: &str,
    ) -> Self {
        Self {
            address,
            protection_level,
            phrase,
            derivation_path: derivation_path.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn protection_level(&self) -> ProtectionLevel {
        self.protection_level
    }

    pub fn phrase(&self) -> &SeedPhrase {
        &self.phrase
    }

    pub fn derivation_path(&self) -> &str {
        &self.derivation_path
    }

    /// Unix timestamp (seconds) of when the seed was stored
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Serialize for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let stored = StoredSeed {
            address: *self.address.as_bytes(),
            protection_level: self.protection_level,
            phrase: self.phrase.expose().to_string(),
            derivation_path: self.derivation_path.clone(),
            created_at: self.created_at,
        };
        postcard::to_allocvec(&stored).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from storage, re-validating the phrase
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let stored: StoredSeed = postcard::from_bytes(bytes)
            .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        let phrase = SeedPhrase::parse(&stored.phrase)
            .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;

        Ok(Self {
            address: Address::from_bytes(stored.address),
            protection_level: stored.protection_level,
            phrase,
            derivation_path: stored.derivation_path.clone(),
            created_at: stored.created_at,
        })
    }
}
