use crate::identity::{Address, AddressError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by every DID this crate issues
pub const DID_PREFIX: &str = "did:ethr:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DidError {
    #[error("Invalid DID format: {0}")]
    InvalidFormat(String),

    #[error("Invalid DID method: expected 'ethr', got '{0}'")]
    InvalidMethod(String),

    #[error("Invalid address in DID: {0}")]
    InvalidAddress(#[from] AddressError),
}

/// Decentralized Identifier in the format: did:ethr:<0x address>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthrDid {
    address: Address,
}

impl EthrDid {
    /// Create a DID from an address
    pub fn from_address(address: Address) -> Self {
        Self { address }
    }

    /// Parse a DID from a string
    pub fn parse(s: &str) -> Result<Self, DidError> {
        if s.is_empty() {
            return Err(DidError::InvalidFormat("DID cannot be empty".into()));
        }

        let parts: Vec<&str> = s.split(':').collect();

        if parts.len() != 3 {
            return Err(DidError::InvalidFormat(format!(
                "Expected 3 parts separated by ':', got {}",
                parts.len()
            )));
        }

        if parts[0] != "did" {
            return Err(DidError::InvalidFormat(format!(
                "Expected 'did' scheme, got '{}'",
                parts[0]
            )));
        }

        if parts[1] != "ethr" {
            return Err(DidError::InvalidMethod(parts[1].to_string()));
        }

        if parts[2].is_empty() {
            return Err(DidError::InvalidFormat("Address part cannot be empty".into()));
        }

        let address = Address::parse(parts[2])?;
        Ok(Self { address })
    }

    /// The address this DID resolves to
    pub fn address(&self) -> Address {
        self.address
    }
}

impl fmt::Display for EthrDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DID_PREFIX, self.address)
    }
}

impl fmt::Debug for EthrDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthrDid({})", self)
    }
}

impl From<Address> for EthrDid {
    fn from(address: Address) -> Self {
        Self::from_address(address)
    }
}

impl FromStr for EthrDid {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EthrDid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EthrDid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EthrDid::parse(&s).map_err(serde::de::Error::custom)
    }
}
