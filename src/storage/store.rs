// Seed storage backends
//
// SeedStore persists records in sled; MemoryBackend keeps them in a map for
// tests and ephemeral sessions. Both store the same encoded bytes.

use crate::identity::Address;
use crate::storage::SeedRecord;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const SEED_PREFIX: &[u8] = b"seed:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Persistence for seed records, keyed by address.
///
/// Implementations must be safe to share between threads; the vault
/// serializes mutations itself.
pub trait SeedBackend: Send + Sync {
    /// Insert or replace the record for its address
    fn put(&self, record: &SeedRecord) -> Result<(), StoreError>;

    /// Load a record
    fn get(&self, address: &Address) -> Result<Option<SeedRecord>, StoreError>;

    /// Remove a record, returning whether it existed
    fn remove(&self, address: &Address) -> Result<bool, StoreError>;

    /// All stored addresses, in ascending key order
    fn addresses(&self) -> Result<Vec<Address>, StoreError>;

    /// Check if an address is stored
    fn contains(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.get(address)?.is_some())
    }
}

fn seed_key(address: &Address) -> Vec<u8> {
    [keys::SEED_PREFIX, address.as_bytes().as_slice()].concat()
}

/// Persistent seed store using sled.
///
/// Writes are flushed before returning so a stored seed survives a crash.
pub struct SeedStore {
    db: sled::Db,
}

impl SeedStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }
}

impl SeedBackend for SeedStore {
    fn put(&self, record: &SeedRecord) -> Result<(), StoreError> {
        let bytes = record.to_bytes()?;
        self.db.insert(seed_key(&record.address()), bytes)?;
        self.flush()
    }

    fn get(&self, address: &Address) -> Result<Option<SeedRecord>, StoreError> {
        match self.db.get(seed_key(address))? {
            Some(bytes) => Ok(Some(SeedRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, address: &Address) -> Result<bool, StoreError> {
        let existed = self.db.remove(seed_key(address))?.is_some();
        if existed {
            self.flush()?;
        }
        Ok(existed)
    }

    fn addresses(&self) -> Result<Vec<Address>, StoreError> {
        let mut addresses = Vec::new();
        for result in self.db.scan_prefix(keys::SEED_PREFIX) {
            let (key, _) = result?;
            let raw: [u8; 20] = key[keys::SEED_PREFIX.len()..].try_into().map_err(|_| {
                StoreError::DeserializationFailed("Invalid address key length".to_string())
            })?;
            addresses.push(Address::from_bytes(raw));
        }
        Ok(addresses)
    }

    fn contains(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(seed_key(address))?)
    }
}

/// In-memory backend. Records are kept encoded, exactly as sled would hold
/// them.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<BTreeMap<Address, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::DatabaseError("lock poisoned".to_string())
}

impl SeedBackend for MemoryBackend {
    fn put(&self, record: &SeedRecord) -> Result<(), StoreError> {
        let bytes = record.to_bytes()?;
        self.records
            .write()
            .map_err(poisoned)?
            .insert(record.address(), bytes);
        Ok(())
    }

    fn get(&self, address: &Address) -> Result<Option<SeedRecord>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        records
            .get(address)
            .map(|bytes| SeedRecord::from_bytes(bytes))
            .transpose()
    }

    fn remove(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self
            .records
            .write()
            .map_err(poisoned)?
            .remove(address)
            .is_some())
    }

    fn addresses(&self) -> Result<Vec<Address>, StoreError> {
        Ok(self.records.read().map_err(poisoned)?.keys().copied().collect())
    }
}
