// Storage module - PERSISTENCE
// Seed records and the backends that hold them (sled, in-memory)

mod record;
mod store;

pub use record::SeedRecord;
pub use store::{MemoryBackend, SeedBackend, SeedStore, StoreError};
