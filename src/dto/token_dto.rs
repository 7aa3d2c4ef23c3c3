use crate::entity::token::UserToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Claims carried by the signed access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: Uuid,
    pub email: String,
    pub status: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl TokenPairDto {
    pub fn from(model: UserToken) -> TokenPairDto {
        Self {
            access_token: model.access_token,
            access_token_expires_at: model.access_token_expires_at,
            refresh_token: model.refresh_token,
            refresh_token_expires_at: model.refresh_token_expires_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct RefreshRequestDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}
