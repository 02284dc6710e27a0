//! Session token issuance and verification

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
};

/// Signs and verifies HS256 session tokens. Stateless: expiry is the only cutoff.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Fails when no signing secret is configured
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        if config.jwt_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "JWT secret is not set (configure auth.jwt_secret or JWT_SECRET)".to_string(),
            ));
        }
        if config.token_ttl_days <= 0 {
            return Err(AppError::Configuration(
                "auth.token_ttl_days must be positive".to_string(),
            ));
        }

        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::days(config.token_ttl_days),
        })
    }

    /// Issue a token for `user`
    pub fn issue(&self, user: &User) -> AppResult<String> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = UserClaims {
            sub: user.id.to_string(),
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> AppResult<UserClaims> {
        decode::<UserClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Authentication("Token has expired".to_string()),
                _ => AppError::Authentication("Invalid or expired token".to_string()),
            })
    }
}
