// ClaimSigner - builds and signs ES256K-R JWTs for vault identities
//
// Every call fetches a fresh signing handle and signs again; nothing is
// memoized since iat (and usually the claim) differ per call.

use crate::identity::{Address, EthrDid};
use crate::jwt::{DecodedJwt, JwtCodec, JwtError, JwtHeader, JwtPayload, ES256K_R};
use crate::vault::{KeyVault, VaultError, RECOVERABLE_SIGNATURE_LEN};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Unknown address: {0}")]
    UnknownAddress(Address),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error(transparent)]
    Encoding(#[from] JwtError),

    #[error(transparent)]
    Vault(VaultError),
}

impl From<VaultError> for SignerError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::NotFound(address) => SignerError::UnknownAddress(address),
            VaultError::SigningFailed(msg) => SignerError::SigningFailed(msg),
            other => SignerError::Vault(other),
        }
    }
}

/// Configuration for the claim signer
#[derive(Clone, Debug, Default)]
pub struct SignerConfig {
    /// Lifetime of issued tokens in seconds; `None` omits `exp`
    pub expires_in_secs: Option<u64>,
}

impl SignerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expires_in_secs(mut self, secs: u64) -> Self {
        self.expires_in_secs = Some(secs);
        self
    }
}

/// A token whose signature has been checked against its issuer
#[derive(Clone, Debug)]
pub struct VerifiedJwt {
    pub issuer: EthrDid,
    pub header: JwtHeader,
    pub payload: JwtPayload,
}

pub struct ClaimSigner {
    vault: Arc<dyn KeyVault>,
    config: SignerConfig,
}

impl ClaimSigner {
    pub fn new(vault: Arc<dyn KeyVault>, config: SignerConfig) -> Self {
        Self { vault, config }
    }

    /// Sign `claim` as the identity at `address`, about itself
    pub async fn sign(&self, address: &Address, claim: Map<String, Value>) -> Result<String, SignerError> {
        let did = EthrDid::from_address(*address);
        self.sign_with_subject(address, &did, claim).await
    }

    /// Sign `claim` as the identity at `address`, about `subject`
    pub async fn sign_with_subject(
        &self,
        address: &Address,
        subject: &EthrDid,
        claim: Map<String, Value>,
    ) -> Result<String, SignerError> {
        let issuer = EthrDid::from_address(*address);
        let now = chrono::Utc::now().timestamp();

        let mut payload = JwtPayload::new(&issuer.to_string(), &subject.to_string(), claim, now);
        if let Some(ttl) = self.config.expires_in_secs {
            let ttl = i64::try_from(ttl)
                .map_err(|_| SignerError::SigningFailed("expiry out of range".to_string()))?;
            payload = payload.with_expiry(now.saturating_add(ttl));
        }

        let handle = self.vault.signing_handle(address).await?;
        if handle.address() != *address {
            return Err(SignerError::SigningFailed(format!(
                "handle is bound to {}, not {}",
                handle.address(),
                address
            )));
        }

        let signing_input = JwtCodec::signing_input(&JwtHeader::es256k_r(), &payload)?;
        let digest: [u8; 32] = Sha256::digest(signing_input.as_bytes()).into();
        let signature = handle.sign_digest(&digest)?;

        let jwt = JwtCodec::assemble(&signing_input, &signature);
        info!(%issuer, %subject, "claim signed");
        debug!(jwt = %jwt, "signed token");
        Ok(jwt)
    }
}

/// Check an ES256K-R token: algorithm, recoverable signature, issuer and
/// expiry.
pub fn verify(jwt: &str) -> Result<VerifiedJwt, JwtError> {
    let decoded = JwtCodec::decode(jwt)?;
    verify_decoded(decoded, chrono::Utc::now().timestamp())
}

/// Verify an already decoded token at a given time
pub fn verify_decoded(decoded: DecodedJwt, now: i64) -> Result<VerifiedJwt, JwtError> {
    if decoded.header.alg != ES256K_R {
        return Err(JwtError::UnsupportedAlgorithm(decoded.header.alg));
    }

    let issuer = EthrDid::parse(&decoded.payload.iss)
        .map_err(|e| JwtError::Malformed(format!("invalid issuer: {}", e)))?;

    let recovered = recover_address(&decoded.signing_input, &decoded.signature)?;
    if recovered != issuer.address() {
        return Err(JwtError::IssuerMismatch {
            claimed: issuer.to_string(),
            recovered: EthrDid::from_address(recovered).to_string(),
        });
    }

    if decoded.payload.is_expired_at(now) {
        return Err(JwtError::Expired(decoded.payload.exp.unwrap_or_default()));
    }

    Ok(VerifiedJwt {
        issuer,
        header: decoded.header,
        payload: decoded.payload,
    })
}

/// Recover the signer's address from an `r || s || v` signature
fn recover_address(signing_input: &str, signature: &[u8]) -> Result<Address, JwtError> {
    if signature.len() != RECOVERABLE_SIGNATURE_LEN {
        return Err(JwtError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            RECOVERABLE_SIGNATURE_LEN,
            signature.len()
        )));
    }

    // Accept both 0/1 and Ethereum-style 27/28 recovery ids
    let v = signature[64];
    let v = if v >= 27 { v - 27 } else { v };

    let recovery_id = RecoveryId::from_i32(i32::from(v))
        .map_err(|e| JwtError::InvalidSignature(e.to_string()))?;
    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|e| JwtError::InvalidSignature(e.to_string()))?;

    let digest: [u8; 32] = Sha256::digest(signing_input.as_bytes()).into();
    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&Message::from_digest(digest), &recoverable)
        .map_err(|e| JwtError::InvalidSignature(e.to_string()))?;

    Ok(Address::from_public_key(&public_key))
}
