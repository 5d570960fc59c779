// Seed phrases and HD key derivation
//
// A seed is a BIP-39 English mnemonic. Keys are derived from it with BIP-32
// along a fixed path; the default path is the uPort identity root so that
// addresses match the ones produced by the mobile signer.

use crate::identity::Address;
use bip39::{Language, Mnemonic};
use bitcoin::bip32::{DerivationPath, Xpriv};
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

/// Derivation path used for identity keys unless configured otherwise
pub const DEFAULT_DERIVATION_PATH: &str = "m/7696500'/0'/0'/0'";

/// Derivation path of the first Ethereum account (BIP-44)
pub const ETHEREUM_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("Invalid seed phrase: {0}")]
    InvalidPhrase(String),

    #[error("Unsupported word count: {0} (expected 12 or 24)")]
    UnsupportedWordCount(usize),

    #[error("Invalid derivation path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

/// BIP-39 mnemonic. The phrase is wiped from memory on drop and never
/// printed by `Debug`.
#[derive(Clone)]
pub struct SeedPhrase {
    phrase: Zeroizing<String>,
}

impl SeedPhrase {
    /// Generate a fresh mnemonic from OS entropy
    pub fn generate(word_count: usize) -> Result<Self, SeedError> {
        let entropy_len = match word_count {
            12 => 16,
            24 => 32,
            other => return Err(SeedError::UnsupportedWordCount(other)),
        };

        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut entropy[..entropy_len]);

        let mnemonic = Mnemonic::from_entropy(&entropy[..entropy_len])
            .map_err(|e| SeedError::InvalidPhrase(e.to_string()))?;
        Ok(Self {
            phrase: Zeroizing::new(mnemonic.to_string()),
        })
    }

    /// Validate and normalize a user-supplied phrase.
    ///
    /// Surrounding whitespace, repeated spaces and letter case are ignored.
    pub fn parse(input: &str) -> Result<Self, SeedError> {
        let normalized = Zeroizing::new(
            input
                .split_whitespace()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join(" "),
        );

        if normalized.is_empty() {
            return Err(SeedError::InvalidPhrase("seed phrase is empty".into()));
        }

        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| SeedError::InvalidPhrase(e.to_string()))?;
        Ok(Self {
            phrase: Zeroizing::new(mnemonic.to_string()),
        })
    }

    /// The normalized phrase. Callers own the exposure.
    pub fn expose(&self) -> &str {
        &self.phrase
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split(' ').count()
    }

    /// Derive the address at `path` without handing out the private key
    pub fn derive_address(&self, path: &str) -> Result<Address, SeedError> {
        let secp = Secp256k1::new();
        let secret = self.derive_secret_key(path)?;
        Ok(Address::from_public_key(&PublicKey::from_secret_key(&secp, &secret)))
    }

    /// Derive the private key at `path`. Restricted to the crate so that
    /// only the vault can hold raw key material.
    pub(crate) fn derive_secret_key(&self, path: &str) -> Result<SecretKey, SeedError> {
        let path = parse_derivation_path(path)?;
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &self.phrase)
            .map_err(|e| SeedError::InvalidPhrase(e.to_string()))?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let secp = Secp256k1::new();
        let master = Xpriv::new_master(bitcoin::Network::Bitcoin, &seed[..])
            .map_err(|e| SeedError::DerivationFailed(e.to_string()))?;
        let child = master
            .derive_priv(&secp, &path)
            .map_err(|e| SeedError::DerivationFailed(e.to_string()))?;

        Ok(child.private_key)
    }
}

/// Parse and validate a BIP-32 derivation path string
pub fn parse_derivation_path(path: &str) -> Result<DerivationPath, SeedError> {
    DerivationPath::from_str(path).map_err(|e| SeedError::InvalidPath {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedPhrase(<{} words>)", self.word_count())
    }
}

impl PartialEq for SeedPhrase {
    fn eq(&self, other: &Self) -> bool {
        *self.phrase == *other.phrase
    }
}

impl Eq for SeedPhrase {}
