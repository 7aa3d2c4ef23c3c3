use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UserError {
    #[error("Email must not be empty")]
    EmptyEmail,
    #[error("Email is already in use")]
    EmailInUse,
    #[error("Identity is already in use")]
    IdentityInUse,
    #[error("Password does not meet the minimum requirements")]
    PasswordRequirements,
    #[error("Password and confirmation password do not match")]
    PasswordsDontMatch,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status_code = match self {
            UserError::EmptyEmail
            | UserError::EmailInUse
            | UserError::IdentityInUse
            | UserError::PasswordRequirements
            | UserError::PasswordsDontMatch => StatusCode::BAD_REQUEST,
            UserError::UserNotFound => StatusCode::NOT_FOUND,
            UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        };

        ErrorResponse::send(self.to_string())
            .with_status(status_code)
            .into_response()
    }
}
