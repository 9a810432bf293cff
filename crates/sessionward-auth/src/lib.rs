//! # sessionward-auth
//!
//! Session lifecycle core: issuing, verifying, rotating, and revoking
//! sessions represented by an access/refresh token pair.
//!
//! ## Modules
//!
//! - `jwt`: access-token claims, signing-key ring, encoder and decoder
//! - `codec`: the token codec façade (access tokens + refresh handles)
//! - `refresh`: refresh-token wire format and the rotation state machine
//! - `csrf`: anti-CSRF token minting and constant-time checks
//! - `store`: the remote core contract, its HTTP client, and an in-memory core
//! - `session`: the operation set and the default `SessionManager`
//! - `recipe`: recipe construction, overrides, and one-shot initialisation

pub mod codec;
pub mod csrf;
pub mod jwt;
pub mod recipe;
pub mod refresh;
pub mod session;
pub mod store;
pub mod tokens;

pub use codec::TokenCodec;
pub use csrf::AntiCsrfGuard;
pub use jwt::{AccessTokenClaims, JwtDecoder, JwtEncoder, SigningKeyRing};
pub use recipe::{RECIPE_ID, RecipeSlot, SessionRecipe, SessionRecipeBuilder};
pub use refresh::{RefreshLineage, RefreshTokenHandle, RotationDecision};
pub use session::{IssuedSession, SessionContainer, SessionManager, SessionOperations};
pub use store::{CoreClient, MemorySessionStore, SessionGrant, SessionStore};
pub use tokens::{AccessToken, RefreshToken};
