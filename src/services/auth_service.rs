use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Tokens expire one day after issue
pub const TOKEN_TTL_HOURS: i64 = 24;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub username: String,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
}

/// Issues and verifies stateless HS256 bearer tokens.
#[derive(Clone)]
pub struct AuthTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthTokens {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    // Generate JWT token
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        self.issue_with_ttl(username, Duration::hours(TOKEN_TTL_HOURS))
    }

    fn issue_with_ttl(&self, username: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + ttl).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    // Verify JWT token (signature + expiry)
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("🔒 Token rejected: {}", e);
                AppError::unauthorized("Invalid or expired token")
            })
    }
}
