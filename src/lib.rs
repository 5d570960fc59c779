//! Local ethr-DID identity vault.
//!
//! Seeds are held by a [`vault::KeyVault`], presented as DIDs by the
//! [`registry::DidRegistry`] and used to issue ES256K-R JWTs through
//! [`jwt::ClaimSigner`]. Applications talk to [`service::IdentityService`].

pub mod config;
pub mod identity;
pub mod jwt;
pub mod registry;
pub mod service;
pub mod storage;
pub mod vault;

pub use config::Config;
pub use service::{IdentityError, IdentityList, IdentityService};
