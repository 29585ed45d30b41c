use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

pub mod password;

pub use password::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has been revoked")]
    Revoked,

    #[error("Password hashing error: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    /// Unique token id, so two logins within the same second yield distinct tokens
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            jti: Uuid::new_v4(),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// sha256 hex digest of a raw token, stored in `revoked_tokens` on logout
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(user_id: i64, exp_offset_hours: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            exp: (now + Duration::hours(exp_offset_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    #[test]
    fn token_round_trip_keeps_subject() {
        let token = generate_jwt_with_secret(&claims_for(42, 1), "secret").unwrap();
        let claims = validate_jwt_with_secret(&token, "secret").unwrap();
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_with_secret(&claims_for(1, 1), "secret").unwrap();
        let err = validate_jwt_with_secret(&token, "other").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_jwt_with_secret(&claims_for(1, -2), "secret").unwrap();
        assert!(validate_jwt_with_secret(&token, "secret").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            generate_jwt_with_secret(&claims_for(1, 1), ""),
            Err(AuthError::InvalidSecret)
        ));
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = token_fingerprint("abc");
        assert_eq!(a, token_fingerprint("abc"));
        assert_eq!(a.len(), 64);
        assert_eq!(a, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn distinct_logins_get_distinct_tokens() {
        let a = generate_jwt_with_secret(&claims_for(7, 1), "secret").unwrap();
        let b = generate_jwt_with_secret(&claims_for(7, 1), "secret").unwrap();
        assert_ne!(a, b);
    }
}
