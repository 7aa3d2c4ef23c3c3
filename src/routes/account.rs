use crate::handler::account_handler;
use crate::state::account_state::AccountState;
use axum::routing::{post, put};
use axum::Router;

pub fn routes() -> Router<AccountState> {
    Router::<AccountState>::new()
        .route("/register", post(account_handler::register))
        .route("/login", post(account_handler::login))
        .route("/refresh", post(account_handler::refresh))
        .route("/users/{identity}/status", put(account_handler::set_status))
}
