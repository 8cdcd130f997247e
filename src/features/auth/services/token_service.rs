use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::Claims;
use crate::features::users::models::User;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

/// Issued access token
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_in: i64,
}

/// Issues HS256 access tokens for authenticated users
pub struct TokenService {
    encoding_key: EncodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl_secs: config.token_ttl.as_secs(),
        }
    }

    pub fn issue(&self, user: &User) -> Result<AccessToken> {
        let now = Utc::now().timestamp().max(0) as u64;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        tracing::debug!("Issued access token for user: {}", user.id);

        Ok(AccessToken {
            token,
            expires_in: self.ttl_secs as i64,
        })
    }
}
