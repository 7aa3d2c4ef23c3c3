use crate::config::parameter;
use crate::dto::token_dto::AccessTokenClaims;
use crate::entity::token::UserToken;
use crate::entity::user::User;
use crate::error::config_error::ConfigError;
use crate::error::token_error::TokenError;
use crate::service::device_service::DeviceDescriptor;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

/// Signing configuration, fixed at startup. The signing key is validated in
/// the constructor so misconfiguration aborts the process instead of failing
/// on a per-request basis.
#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
    pub access_ttl_hours: i64,
    pub refresh_ttl_hours: i64,
}

#[derive(Clone, Debug)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    pub fn new() -> Result<Self, ConfigError> {
        let config = TokenConfig {
            issuer: parameter::get("JWT_ISSUER")?,
            audience: parameter::get("JWT_AUDIENCE")?,
            secret: parameter::get("JWT_SECRET")?,
            access_ttl_hours: parameter::get_i64("ACCESS_TOKEN_TTL_HOURS")?,
            refresh_ttl_hours: parameter::get_i64("REFRESH_TOKEN_TTL_HOURS")?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: TokenConfig) -> Result<Self, ConfigError> {
        // HS256 needs at least 256 bits of key material.
        if config.secret.len() < 32 {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!(
                    "signing key must be at least 32 bytes, got {}",
                    config.secret.len()
                ),
            });
        }
        if config.access_ttl_hours <= 0 || config.refresh_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_TTL_HOURS",
                reason: "token lifetimes must be positive".to_string(),
            });
        }

        Ok(Self { config })
    }

    /// Issue a fresh access/refresh pair for a user on a given device. The
    /// pair is not persisted here; issuing never invalidates prior pairs.
    pub fn issue(&self, user: &User, device: &DeviceDescriptor) -> Result<UserToken, TokenError> {
        let now = Utc::now();
        let access_expires_at = now + Duration::hours(self.config.access_ttl_hours);
        let refresh_expires_at = now + Duration::hours(self.config.refresh_ttl_hours);

        let claims = AccessTokenClaims {
            sub: user.identity,
            email: user.email.clone(),
            status: user.status.as_str().to_string(),
            iat: now.timestamp(),
            exp: access_expires_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: Uuid::now_v7().to_string(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_ref()),
        )
        .map_err(|e| TokenError::TokenCreation(e.to_string()))?;

        Ok(UserToken::new(
            user.id,
            access_token,
            access_expires_at,
            Self::generate_refresh_token(),
            refresh_expires_at,
            device,
        ))
    }

    /// Opaque high-entropy refresh token: 32 random bytes, base64.
    fn generate_refresh_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }
}
