use crate::entity::user::{User, UserStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration payload. Only shape limits are enforced here; presence and
/// ordering-sensitive checks belong to the account service so the caller
/// always sees the specific error the flow defines.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct SignUpDto {
    #[validate(length(max = 200, message = "Full name must not exceed 200 characters"))]
    pub full_name: String,
    #[validate(length(max = 128, message = "Password must not exceed 128 characters"))]
    pub password: String,
    #[validate(length(max = 128, message = "Confirmation password must not exceed 128 characters"))]
    pub confirmation_password: String,
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone must not exceed 20 characters"))]
    pub phone: String,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct LoginDto {
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: String,
    #[validate(length(max = 128, message = "Password must not exceed 128 characters"))]
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeStatusDto {
    pub active: bool,
}

/// Outward user representation. The password digest never appears here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserReadDto {
    pub identity: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub status: UserStatus,
    pub last_logged_in: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl UserReadDto {
    pub fn from(model: User) -> UserReadDto {
        Self {
            identity: model.identity,
            full_name: model.full_name,
            email: model.email,
            phone: model.phone,
            status: model.status,
            last_logged_in: model.last_logged_in,
            created_at: model.created_at,
            modified_at: model.modified_at,
        }
    }
}

impl std::fmt::Debug for SignUpDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpDto")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish()
    }
}

impl std::fmt::Debug for LoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginDto")
            .field("email", &self.email)
            .finish()
    }
}
