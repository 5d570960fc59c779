use crate::identity::Address;
use crate::vault::VaultError;
use secp256k1::{Message, Secp256k1, SecretKey};
use std::fmt;
use std::sync::Arc;

/// Length of a recoverable signature: r (32) || s (32) || recovery id (1)
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Something that can sign a 32-byte digest for one address.
///
/// Hardware or platform keystores implement this to plug into
/// [`SigningHandle`] without exposing key bytes.
pub trait DigestSigner: Send + Sync {
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], VaultError>;
}

/// Opaque, address-bound signing capability
#[derive(Clone)]
pub struct SigningHandle {
    address: Address,
    signer: Arc<dyn DigestSigner>,
}

impl SigningHandle {
    pub fn new(address: Address, signer: Arc<dyn DigestSigner>) -> Self {
        Self { address, signer }
    }

    /// Address the handle signs for
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a digest, returning `r || s || v`
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], VaultError> {
        self.signer.sign_digest(digest)
    }
}

impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningHandle")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// In-process secp256k1 key. Only the vault constructs these.
pub(crate) struct SoftwareKey {
    secret: SecretKey,
}

impl SoftwareKey {
    pub(crate) fn new(secret: SecretKey) -> Self {
        Self { secret }
    }
}

impl DigestSigner for SoftwareKey {
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; RECOVERABLE_SIGNATURE_LEN], VaultError> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(*digest);
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let recovery = u8::try_from(recovery_id.to_i32())
            .map_err(|_| VaultError::SigningFailed("recovery id out of range".into()))?;

        let mut out = [0u8; RECOVERABLE_SIGNATURE_LEN];
        out[..64].copy_from_slice(&compact);
        out[64] = recovery;
        Ok(out)
    }
}

impl Drop for SoftwareKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}
