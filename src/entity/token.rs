use crate::entity::audit::{AuditStamp, Audited};
use crate::service::device_service::DeviceDescriptor;
use chrono::{DateTime, Utc};

/// An issued access/refresh token pair, owned by exactly one user and bound
/// to the device that requested it. Pairs are created together; a refresh
/// supersedes the old pair rather than deleting it.
#[derive(Clone, sqlx::FromRow)]
pub struct UserToken {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub device_brand: String,
    pub device_model: String,
    pub os: String,
    pub os_version: String,
    pub client_name: String,
    pub client_type: String,
    pub client_version: String,
    pub superseded: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl UserToken {
    pub fn new(
        user_id: i64,
        access_token: String,
        access_token_expires_at: DateTime<Utc>,
        refresh_token: String,
        refresh_token_expires_at: DateTime<Utc>,
        device: &DeviceDescriptor,
    ) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: 0,
            user_id,
            access_token,
            access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
            device_brand: device.device_brand.clone(),
            device_model: device.device_model.clone(),
            os: device.os.clone(),
            os_version: device.os_version.clone(),
            client_name: device.client_name.clone(),
            client_type: device.client_type.clone(),
            client_version: device.client_version.clone(),
            superseded: false,
            created_at: epoch,
            modified_at: epoch,
        }
    }

    /// Rebuild the descriptor this pair was issued against, used when a
    /// refresh re-issues for the same device.
    pub fn device(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            device_brand: self.device_brand.clone(),
            device_model: self.device_model.clone(),
            os: self.os.clone(),
            os_version: self.os_version.clone(),
            client_name: self.client_name.clone(),
            client_type: self.client_type.clone(),
            client_version: self.client_version.clone(),
        }
    }

    pub fn refresh_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token_expires_at <= now
    }
}

impl Audited for UserToken {
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

impl std::fmt::Debug for UserToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserToken")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("refresh_token_expires_at", &self.refresh_token_expires_at)
            .field("superseded", &self.superseded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn refresh_expiry_is_a_plain_timestamp_comparison() {
        let now = Utc::now();
        let token = UserToken::new(
            1,
            "access".to_string(),
            now + Duration::hours(7),
            "refresh".to_string(),
            now + Duration::hours(60),
            &DeviceDescriptor::default(),
        );

        assert!(!token.refresh_token_expired(now));
        assert!(token.refresh_token_expired(now + Duration::hours(60)));
        assert!(token.refresh_token_expired(now + Duration::hours(61)));
    }

    #[test]
    fn device_round_trips_through_the_stored_columns() {
        let device = DeviceDescriptor {
            device_brand: "Apple".to_string(),
            device_model: "iPhone".to_string(),
            os: "iOS".to_string(),
            os_version: "17.2".to_string(),
            client_name: "Safari".to_string(),
            client_type: "browser".to_string(),
            client_version: "17.2".to_string(),
        };
        let now = Utc::now();
        let token = UserToken::new(1, "a".into(), now, "r".into(), now, &device);

        assert_eq!(token.device(), device);
    }
}
