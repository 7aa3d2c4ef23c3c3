use crate::config::database::{Database, DatabaseTrait};
use crate::entity::audit::{stamp_insert, stamp_update};
use crate::entity::token::UserToken;
use crate::entity::user::{User, UserRecord};
use crate::error::db_error::DbError;
use crate::error::AppError;
use crate::repository::user_repository::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;

const TOKEN_COLUMNS: &str = "id, user_id, access_token, access_token_expires_at, refresh_token, \
                             refresh_token_expires_at, device_brand, device_model, os, os_version, \
                             client_name, client_type, client_version, superseded, created_at, \
                             modified_at";

#[derive(Clone)]
pub struct TokenRepository {
    db_conn: Arc<Database>,
}

/// Persistence boundary for token pairs. The two write paths are whole
/// transactions: a pair never commits without its companion write.
#[async_trait]
pub trait TokenRepositoryTrait {
    /// Look up a live pair by its opaque refresh-token value, joined with the
    /// owning user. The access token is never a lookup key.
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<(User, UserToken)>, AppError>;
    /// Persist a freshly issued pair and the owner's LastLoggedIn timestamp in
    /// one transaction.
    async fn save_for_login(
        &self,
        token: UserToken,
        user: &User,
        at: DateTime<Utc>,
    ) -> Result<UserToken, DbError>;
    /// Supersede `old` and persist its replacement in one transaction. The old
    /// row is kept, flagged, for the audit trail. Concurrent rotations of the
    /// same pair get exactly one winner; the loser sees `DbError::NotFound`.
    async fn rotate(&self, old: &UserToken, new: UserToken) -> Result<UserToken, DbError>;
}

impl TokenRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }

    async fn save(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut token: UserToken,
    ) -> Result<UserToken, DbError> {
        stamp_insert(&mut token);

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO user_tokens \
             (user_id, access_token, access_token_expires_at, refresh_token, \
              refresh_token_expires_at, device_brand, device_model, os, os_version, \
              client_name, client_type, client_version, superseded, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING id",
        )
        .bind(token.user_id)
        .bind(&token.access_token)
        .bind(token.access_token_expires_at)
        .bind(&token.refresh_token)
        .bind(token.refresh_token_expires_at)
        .bind(&token.device_brand)
        .bind(&token.device_model)
        .bind(&token.os)
        .bind(&token.os_version)
        .bind(&token.client_name)
        .bind(&token.client_type)
        .bind(&token.client_version)
        .bind(token.superseded)
        .bind(token.created_at)
        .bind(token.modified_at)
        .fetch_one(&mut **tx)
        .await?;

        token.id = id;
        Ok(token)
    }

    async fn mark_superseded(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &UserToken,
    ) -> Result<(), DbError> {
        let mut updated = token.clone();
        updated.superseded = true;
        stamp_update(&mut updated, token);

        // Guarded on the flag so only one of two concurrent rotations can
        // claim the row.
        let result = sqlx::query(
            "UPDATE user_tokens SET superseded = TRUE, modified_at = $1 \
             WHERE id = $2 AND superseded = FALSE",
        )
        .bind(updated.modified_at)
        .bind(updated.id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TokenRepositoryTrait for TokenRepository {
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<(User, UserToken)>, AppError> {
        let token = sqlx::query_as::<_, UserToken>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM user_tokens \
             WHERE refresh_token = $1 AND superseded = FALSE"
        ))
        .bind(refresh_token)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(DbError::from)?;

        let Some(token) = token else {
            return Ok(None);
        };

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, identity, full_name, email, phone, password, status, last_logged_in, \
             avatar, avatar_mime_type, created_at, modified_at FROM users WHERE id = $1",
        )
        .bind(token.user_id)
        .fetch_one(self.db_conn.get_pool())
        .await
        .map_err(DbError::from)?;

        let user = User::try_from(record)?;
        Ok(Some((user, token)))
    }

    async fn save_for_login(
        &self,
        token: UserToken,
        user: &User,
        at: DateTime<Utc>,
    ) -> Result<UserToken, DbError> {
        let mut tx = self.db_conn.get_pool().begin().await?;

        let token = self.save(&mut tx, token).await?;
        UserRepository::new(&self.db_conn)
            .touch_last_logged_in(&mut tx, user, at)
            .await?;

        tx.commit().await?;
        Ok(token)
    }

    async fn rotate(&self, old: &UserToken, new: UserToken) -> Result<UserToken, DbError> {
        let mut tx = self.db_conn.get_pool().begin().await?;

        self.mark_superseded(&mut tx, old).await?;
        let new = self.save(&mut tx, new).await?;

        tx.commit().await?;
        Ok(new)
    }
}
