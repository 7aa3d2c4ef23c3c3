use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The store layer surfaces only these kinds. Conflict carries the violated
/// constraint name so the caller can translate it into the matching
/// business error without inspecting message text.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unique constraint '{0}' violated")]
    Conflict(String),
    #[error("Record not found")]
    NotFound,
    #[error("Database error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DbError::Conflict(db.constraint().unwrap_or_default().to_string())
            }
            _ => DbError::Other(error.to_string()),
        }
    }
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let status_code = match self {
            DbError::Conflict(_) => StatusCode::CONFLICT,
            DbError::NotFound => StatusCode::NOT_FOUND,
            DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            // Internal detail stays out of the response body.
            DbError::Other(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        ErrorResponse::send(message)
            .with_status(status_code)
            .into_response()
    }
}
