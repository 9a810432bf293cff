//! Access-token claims, signing keys, encoding, and verification.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod keys;

pub use claims::AccessTokenClaims;
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
pub use keys::SigningKeyRing;
