//! Token service: signed, time-bounded identity tokens (HS256).
//!
//! Claims are a fixed struct, not an open key-value map. The signing
//! secret and validity window are process-wide configuration; rotating
//! the secret invalidates every outstanding token (no revocation list).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject username
    pub sub: String,
    /// Numeric user identifier
    pub uid: i64,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds), always iat + configured window
    pub exp: i64,
}

impl Claims {
    pub fn new(username: String, user_id: i64) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: username,
            uid: user_id,
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("token generation failed: {0}")]
    Generation(String),
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Issue a signed token for the given identity.
pub fn issue_token(username: &str, user_id: i64) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let claims = Claims::new(username.to_string(), user_id);
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| TokenError::Generation(e.to_string()))
}

/// Validate a token and return its claims.
///
/// Fails on bad signature, past expiry, or malformed input. Callers get
/// claim values only through this function, so there is no way to read an
/// unvalidated token.
pub fn validate_token(token: &str) -> Result<Claims, TokenError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Invalid(e.to_string()))
}
