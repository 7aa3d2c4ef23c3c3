use crate::entity::audit::{AuditStamp, Audited};
use crate::error::config_error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account status, persisted as a string column. The mapping is explicit and
/// validated on read; an unknown value in the database is a configuration
/// fault, never a silent default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Inactive,
    Active,
    Locked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Active => "ACTIVE",
            UserStatus::Locked => "LOCKED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "INACTIVE" => Ok(UserStatus::Inactive),
            "ACTIVE" => Ok(UserStatus::Active),
            "LOCKED" => Ok(UserStatus::Locked),
            other => Err(ConfigError::UnknownEnumValue {
                enum_name: "UserStatus",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct User {
    pub id: i64,
    /// Stable public identifier, distinct from the numeric key.
    pub identity: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// Password digest. Never serialized outward.
    pub password: String,
    pub status: UserStatus,
    pub last_logged_in: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub avatar_mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl User {
    /// A user as it exists before first persistence. Audit fields are zeroed
    /// here and set by the stamping hook inside the repository.
    pub fn new(
        full_name: String,
        email: String,
        phone: String,
        password_digest: String,
        status: UserStatus,
    ) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: 0,
            identity: Uuid::new_v4(),
            full_name,
            email,
            phone,
            password: password_digest,
            status,
            last_logged_in: None,
            avatar: None,
            avatar_mime_type: None,
            created_at: epoch,
            modified_at: epoch,
        }
    }
}

impl Audited for User {
    fn audit(&self) -> AuditStamp {
        AuditStamp {
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    fn apply_audit(&mut self, stamp: AuditStamp) {
        self.created_at = stamp.created_at;
        self.modified_at = stamp.modified_at;
    }
}

/// Row image straight out of sqlx, before the status string is validated.
#[derive(sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub identity: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub status: String,
    pub last_logged_in: Option<DateTime<Utc>>,
    pub avatar: Option<String>,
    pub avatar_mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = ConfigError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let status = UserStatus::parse(&record.status)?;
        Ok(User {
            id: record.id,
            identity: record.identity,
            full_name: record.full_name,
            email: record.email,
            phone: record.phone,
            password: record.password,
            status,
            last_logged_in: record.last_logged_in,
            avatar: record.avatar,
            avatar_mime_type: record.avatar_mime_type,
            created_at: record.created_at,
            modified_at: record.modified_at,
        })
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("email", &self.email)
            .field("status", &self.status)
            .finish()
    }
}
