// Registry module - DID listing and selection

mod did_registry;

pub use did_registry::{DidRecord, DidRegistry, RegistryError};
