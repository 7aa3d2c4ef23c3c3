use crate::config::database::{Database, DatabaseTrait};
use crate::response::app_response::{ErrorResponse, SuccessResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;

pub async fn health_check(State(db_conn): State<Arc<Database>>) -> Response {
    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(db_conn.get_pool())
        .await
    {
        Ok(_) => SuccessResponse::send(json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::error!("Health check database probe failed: {}", e);
            ErrorResponse::send("Database unavailable".to_string())
                .with_status(StatusCode::SERVICE_UNAVAILABLE)
                .into_response()
        }
    }
}
