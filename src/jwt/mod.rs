// JWT module - ES256K-R claim tokens
// Compact serialization, signing through vault handles, and verification

mod claims;
mod codec;
mod signer;

pub use claims::{JwtHeader, JwtPayload, ES256K_R};
pub use codec::{DecodedJwt, JwtCodec, JwtError};
pub use signer::{verify, verify_decoded, ClaimSigner, SignerConfig, SignerError, VerifiedJwt};
