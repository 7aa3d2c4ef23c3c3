use crate::config::database::Database;
use crate::error::config_error::ConfigError;
use crate::handler::health_handler;
use crate::routes::account;
use crate::state::account_state::AccountState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn routes(db_conn: Arc<Database>) -> Result<Router, ConfigError> {
    let account_state = AccountState::new(&db_conn)?;

    let merged_router = account::routes().with_state(account_state).merge(
        Router::new()
            .route("/health", get(health_handler::health_check))
            .with_state(db_conn.clone()),
    );

    let app_router = Router::new()
        .nest("/api", merged_router)
        .layer(TraceLayer::new_for_http());

    Ok(app_router)
}
