//! Signed session tokens (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{Role, User, UserId};
use crate::error::TaskboardError;

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub user_id: UserId,
    /// Username at issue time.
    pub username: String,
    /// Role at issue time.
    pub role: Role,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

/// Issues and validates session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    /// Creates an authority signing with `secret`; tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issues a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::Internal`] if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, TaskboardError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TaskboardError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| TaskboardError::Internal(format!("failed to sign token: {e}")))
    }

    /// Validates signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::Unauthorized`] for malformed, forged or
    /// expired tokens.
    pub fn validate(&self, token: &str) -> Result<Claims, TaskboardError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| TaskboardError::Unauthorized(format!("invalid token: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(11),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            role,
            color: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_validates() {
        let authority = TokenAuthority::new(b"secret", Duration::hours(72));
        let Ok(token) = authority.issue(&user(Role::Admin)) else {
            panic!("issue failed");
        };
        let Ok(claims) = authority.validate(&token) else {
            panic!("validation failed");
        };
        assert_eq!(claims.user_id, UserId::new(11));
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let issuer = TokenAuthority::new(b"one", Duration::hours(1));
        let verifier = TokenAuthority::new(b"two", Duration::hours(1));
        let Ok(token) = issuer.issue(&user(Role::User)) else {
            panic!("issue failed");
        };
        assert!(matches!(
            verifier.validate(&token),
            Err(TaskboardError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = TokenAuthority::new(b"secret", Duration::hours(1));
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            user_id: UserId::new(1),
            username: "bob".to_string(),
            role: Role::User,
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
        };
        let Ok(token) = authority.sign(&claims) else {
            panic!("sign failed");
        };
        assert!(authority.validate(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let authority = TokenAuthority::new(b"secret", Duration::hours(1));
        assert!(authority.validate("not.a.token").is_err());
    }
}
