// Vault module - custody of seed material and signing capabilities

mod confirm;
mod handle;
mod keyvault;
mod protection;
mod seed_vault;

pub use confirm::{AutoConfirm, Confirmer, MockConfirmer, SHOW_SEED_PROMPT, SIGN_PROMPT, STORE_PROMPT};
pub use handle::{DigestSigner, SigningHandle, RECOVERABLE_SIGNATURE_LEN};
pub(crate) use handle::SoftwareKey;
pub use keyvault::{KeyVault, VaultConfig, VaultError};
pub use protection::ProtectionLevel;
pub use seed_vault::SeedVault;
