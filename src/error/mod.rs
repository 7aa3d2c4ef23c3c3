pub(crate) mod config_error;
pub(crate) mod db_error;
pub(crate) mod request_error;
pub(crate) mod token_error;
pub(crate) mod user_error;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Unified application error. Every business failure is a typed variant so
/// the transport layer can pick a status code without looking at messages.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    User(#[from] user_error::UserError),
    #[error(transparent)]
    Token(#[from] token_error::TokenError),
    #[error(transparent)]
    Db(#[from] db_error::DbError),
    #[error(transparent)]
    Config(#[from] config_error::ConfigError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use crate::response::app_response::ErrorResponse;

        match self {
            AppError::User(error) => error.into_response(),
            AppError::Token(error) => error.into_response(),
            AppError::Db(error) => error.into_response(),
            AppError::Config(_) => ErrorResponse::send("Configuration error".to_string())
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
        }
    }
}
