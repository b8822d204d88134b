//! Authentication data models.

use serde::{Deserialize, Serialize};

/// Player ID type
pub type PlayerId = i64;

/// Verified player identity attached to every request and connection.
///
/// Issued by the gateway after token verification; the core never
/// re-verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub username: String,
}

impl PlayerRef {
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

impl std::fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

/// JWT claims for access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: PlayerId,         // Player ID
    pub username: String,
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
}

impl From<AccessTokenClaims> for PlayerRef {
    fn from(claims: AccessTokenClaims) -> Self {
        PlayerRef {
            id: claims.sub,
            username: claims.username,
        }
    }
}
