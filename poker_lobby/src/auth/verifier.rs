//! Access token verification.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, PlayerId, PlayerRef},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Verifies HS256 access tokens issued by the authentication service
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
}

impl TokenVerifier {
    /// Create a verifier for tokens signed with `jwt_secret`
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_duration: Duration::minutes(15),
        }
    }

    /// Verify an access token and return the player it belongs to
    ///
    /// # Errors
    ///
    /// * `AuthError::JwtError` - Bad signature, malformed or expired token
    /// * `AuthError::MissingUsername` - Claims without a username
    pub fn verify(&self, token: &str) -> AuthResult<PlayerRef> {
        let token_data =
            decode::<AccessTokenClaims>(token, &self.decoding_key, &Validation::default())?;

        if token_data.claims.username.trim().is_empty() {
            return Err(AuthError::MissingUsername);
        }

        Ok(token_data.claims.into())
    }

    /// Sign an access token with the shared secret.
    ///
    /// Used by development tooling and tests; production tokens come from the
    /// authentication service.
    pub fn issue_access_token(&self, player_id: PlayerId, username: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: player_id,
            username: username.to_string(),
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_for_testing_only_0123";

    #[test]
    fn test_round_trip_identity() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue_access_token(42, "alice").unwrap();

        let player = verifier.verify(&token).unwrap();
        assert_eq!(player, PlayerRef::new(42, "alice"));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let issuer = TokenVerifier::new("another_secret_key_for_testing_only_99");
        let token = issuer.issue_access_token(42, "alice").unwrap();

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::JwtError(_)));
        assert_eq!(err.client_message(), "Authentication failed");
    }

    #[test]
    fn test_rejects_garbage() {
        let verifier = TokenVerifier::new(SECRET);
        assert!(verifier.verify("not.a.token").is_err());
    }

    #[test]
    fn test_rejects_blank_username() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue_access_token(1, "  ").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::MissingUsername)
        ));
    }
}
