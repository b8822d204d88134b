//! Connection gateway boundary: verified player identities.
//!
//! Credential storage, password hashing and token issuance belong to the
//! authentication service. The lobby only verifies HS256 access tokens signed
//! with the shared secret and turns their claims into a [`PlayerRef`].
//!
//! ## Example
//!
//! ```
//! use poker_lobby::auth::TokenVerifier;
//!
//! let verifier = TokenVerifier::new("a_shared_secret_of_at_least_32_chars!");
//! let token = verifier.issue_access_token(7, "alice").unwrap();
//! let player = verifier.verify(&token).unwrap();
//! assert_eq!(player.id, 7);
//! ```

pub mod errors;
pub mod models;
pub mod verifier;

pub use errors::{AuthError, AuthResult};
pub use models::{AccessTokenClaims, PlayerId, PlayerRef};
pub use verifier::TokenVerifier;
