use crate::config::parameter;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{pool::PoolOptions, Pool, Postgres};
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init() -> Result<Self, AppError>
    where
        Self: Sized;
    fn get_pool(&self) -> &Pool<Postgres>;
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init() -> Result<Self, AppError> {
        let database_url = parameter::get("DATABASE_URL")?;
        let max_connections = parameter::get_i64("DB_MAX_CONNECTIONS")? as u32;
        let acquire_timeout_seconds = parameter::get_i64("DB_ACQUIRE_TIMEOUT_SECONDS")? as u64;

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(acquire_timeout_seconds))
            .connect(&database_url)
            .await
            .map_err(crate::error::db_error::DbError::from)?;

        info!(
            "Database pool configured: max={}, acquire_timeout={}s",
            max_connections, acquire_timeout_seconds
        );

        Ok(Self { pool })
    }

    fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
