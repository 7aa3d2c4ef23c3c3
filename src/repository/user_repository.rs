use crate::config::database::{Database, DatabaseTrait};
use crate::entity::audit::{stamp_insert, stamp_update};
use crate::entity::user::{User, UserRecord, UserStatus};
use crate::error::db_error::DbError;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, identity, full_name, email, phone, password, status, \
                            last_logged_in, avatar, avatar_mime_type, created_at, modified_at";

#[derive(Clone)]
pub struct UserRepository {
    db_conn: Arc<Database>,
}

/// Persistence boundary for user records. The account service is generic
/// over this trait so the orchestration flows can run against an in-memory
/// store in tests.
#[async_trait]
pub trait UserRepositoryTrait {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_identity(&self, identity: Uuid) -> Result<Option<User>, AppError>;
    /// Insert a new user. The application-level uniqueness pre-check is
    /// advisory; the unique indexes turn a concurrent duplicate into a
    /// `DbError::Conflict` carrying the violated constraint name.
    async fn create(&self, user: User) -> Result<User, AppError>;
    async fn update_status(&self, identity: Uuid, status: UserStatus) -> Result<User, AppError>;
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }

    /// Transaction-scoped so the caller can commit it atomically with the
    /// token write it accompanies.
    pub(crate) async fn touch_last_logged_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &User,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let mut updated = user.clone();
        updated.last_logged_in = Some(at);
        stamp_update(&mut updated, user);

        sqlx::query("UPDATE users SET last_logged_in = $1, modified_at = $2 WHERE id = $3")
            .bind(updated.last_logged_in)
            .bind(updated.modified_at)
            .bind(updated.id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(DbError::from)?;

        record.map(User::try_from).transpose().map_err(AppError::from)
    }

    async fn find_by_identity(&self, identity: Uuid) -> Result<Option<User>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE identity = $1"
        ))
        .bind(identity)
        .fetch_optional(self.db_conn.get_pool())
        .await
        .map_err(DbError::from)?;

        record.map(User::try_from).transpose().map_err(AppError::from)
    }

    async fn create(&self, mut user: User) -> Result<User, AppError> {
        stamp_insert(&mut user);

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users \
             (identity, full_name, email, phone, password, status, last_logged_in, \
              avatar, avatar_mime_type, created_at, modified_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(user.identity)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(user.status.as_str())
        .bind(user.last_logged_in)
        .bind(&user.avatar)
        .bind(&user.avatar_mime_type)
        .bind(user.created_at)
        .bind(user.modified_at)
        .fetch_one(self.db_conn.get_pool())
        .await
        .map_err(DbError::from)?;

        user.id = id;
        Ok(user)
    }

    async fn update_status(&self, identity: Uuid, status: UserStatus) -> Result<User, AppError> {
        let mut tx = self.db_conn.get_pool().begin().await.map_err(DbError::from)?;

        // Row lock gives a stable prior snapshot for the audit stamp.
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE identity = $1 FOR UPDATE"
        ))
        .bind(identity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or(DbError::NotFound)?;

        let prior = User::try_from(record)?;
        let mut updated = prior.clone();
        updated.status = status;
        stamp_update(&mut updated, &prior);

        sqlx::query("UPDATE users SET status = $1, modified_at = $2 WHERE id = $3")
            .bind(updated.status.as_str())
            .bind(updated.modified_at)
            .bind(updated.id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(updated)
    }
}
