//! Access token issuance and verification (HS256).
//!
//! Tokens are self-contained: validity is the signature plus `exp`, nothing
//! is looked up in storage.

use crate::error::{AuthError, Result};
use crate::models::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        }
    }

    /// Sign a token for `user` that expires after the configured lifetime
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.expires_in).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Failed to sign access token");
            AuthError::JwtError(e.to_string())
        })
    }

    /// Check signature and expiry; expired tokens map to `TokenExpired`,
    /// everything else to `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt";

    fn user() -> User {
        User {
            id: 42,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            role_id: Some(1),
            last_ip: None,
            last_login: None,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let service = TokenService::new(SECRET, Duration::hours(1));
        let token = service.issue(&user()).unwrap();

        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.id, 42);
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(SECRET, Duration::seconds(-60));
        let token = service.issue(&user()).unwrap();

        let err = service.verify(&token).unwrap_err();

        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new(SECRET, Duration::hours(1));
        let verifier = TokenService::new("another-secret", Duration::hours(1));
        let token = issuer.issue(&user()).unwrap();

        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        let service = TokenService::new(SECRET, Duration::hours(1));

        let err = service.verify("garbage").unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken(_)));
        assert_eq!(err.public_message(), "Invalid or expired token");
    }
}
