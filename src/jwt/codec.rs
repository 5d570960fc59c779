use crate::jwt::{JwtHeader, JwtPayload};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while encoding, decoding or verifying a JWT
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode JWT segment: {0}")]
    EncodeError(String),

    #[error("Malformed JWT: {0}")]
    Malformed(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Issuer mismatch: token claims {claimed}, signature recovers {recovered}")]
    IssuerMismatch { claimed: String, recovered: String },

    #[error("Token expired at {0}")]
    Expired(i64),
}

/// A compact JWT split into its parts. Nothing has been verified yet.
#[derive(Clone, Debug)]
pub struct DecodedJwt {
    pub header: JwtHeader,
    pub payload: JwtPayload,
    pub signature: Vec<u8>,
    /// `base64url(header).base64url(payload)` exactly as received
    pub signing_input: String,
}

/// Codec for compact JWT serialization
pub struct JwtCodec;

impl JwtCodec {
    /// Encode a value as a base64url (no padding) JSON segment
    pub fn encode_segment<T: Serialize>(value: &T) -> Result<String, JwtError> {
        let json = serde_json::to_vec(value).map_err(|e| JwtError::EncodeError(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a base64url JSON segment
    pub fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, JwtError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| JwtError::Malformed(format!("invalid base64url: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| JwtError::Malformed(format!("invalid JSON: {}", e)))
    }

    /// Build the signing input for a header and payload
    pub fn signing_input(header: &JwtHeader, payload: &JwtPayload) -> Result<String, JwtError> {
        Ok(format!(
            "{}.{}",
            Self::encode_segment(header)?,
            Self::encode_segment(payload)?
        ))
    }

    /// Append a signature to a signing input
    pub fn assemble(signing_input: &str, signature: &[u8]) -> String {
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }

    /// Split and decode a compact JWT
    pub fn decode(jwt: &str) -> Result<DecodedJwt, JwtError> {
        let parts: Vec<&str> = jwt.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(JwtError::Malformed(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(JwtError::Malformed("empty segment".to_string()));
        }

        let header: JwtHeader = Self::decode_segment(parts[0])?;
        let payload: JwtPayload = Self::decode_segment(parts[1])?;
        let signature = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|e| JwtError::Malformed(format!("invalid signature encoding: {}", e)))?;

        Ok(DecodedJwt {
            header,
            payload,
            signature,
            signing_input: format!("{}.{}", parts[0], parts[1]),
        })
    }
}
