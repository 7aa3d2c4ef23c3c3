use crate::config::database::Database;
use crate::error::config_error::ConfigError;
use crate::repository::token_repository::TokenRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::account_service::AccountService;
use crate::service::token_service::TokenService;
use std::sync::Arc;

/// Explicit constructor wiring of the account subsystem; no runtime
/// container. Built once at process start.
#[derive(Clone)]
pub struct AccountState {
    pub(crate) account_service: AccountService<UserRepository, TokenRepository>,
}

impl AccountState {
    pub fn new(db_conn: &Arc<Database>) -> Result<Self, ConfigError> {
        let token_service = TokenService::new()?;
        Ok(Self {
            account_service: AccountService::new(db_conn, token_service)?,
        })
    }
}
