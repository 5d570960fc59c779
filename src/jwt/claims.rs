use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Algorithm identifier required by the ethr DID method
pub const ES256K_R: &str = "ES256K-R";

/// JWT header: `{"typ":"JWT","alg":"ES256K-R"}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtHeader {
    pub typ: String,
    pub alg: String,
}

impl JwtHeader {
    pub fn es256k_r() -> Self {
        Self {
            typ: "JWT".to_string(),
            alg: ES256K_R.to_string(),
        }
    }
}

/// JWT payload for an issued claim.
///
/// Unknown members of received tokens are kept in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwtPayload {
    /// Issued-at, unix seconds
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    pub sub: String,
    #[serde(default)]
    pub claim: Map<String, Value>,
    pub iss: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwtPayload {
    pub fn new(issuer: &str, subject: &str, claim: Map<String, Value>, issued_at: i64) -> Self {
        Self {
            iat: issued_at,
            exp: None,
            sub: subject.to_string(),
            claim,
            iss: issuer.to_string(),
            extra: Map::new(),
        }
    }

    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.map(|exp| exp <= now).unwrap_or(false)
    }
}
