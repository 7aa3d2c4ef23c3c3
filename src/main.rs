use crate::config::database::DatabaseTrait;
use crate::config::{database, parameter};
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod dto;
mod entity;
mod error;
mod handler;
mod repository;
mod response;
mod routes;
mod service;
mod state;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::logging::init();
    parameter::init();
    info!("Configuration initialized");

    let connection = match database::Database::init().await {
        Ok(conn) => {
            info!("Database connection established");
            conn
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let server_address = parameter::get("SERVER_ADDRESS")?;
    let server_port = parameter::get("SERVER_PORT")?;
    let host = format!("{}:{}", server_address, server_port);

    // Signing-key problems are fatal here, before the listener opens.
    let app = match routes::root::routes(Arc::new(connection)) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to initialize routes: {}", e);
            return Err(e.into());
        }
    };

    let listener = tokio::net::TcpListener::bind(&host).await?;
    info!("Server listening on {}", host);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", e);
            } else {
                info!("Shutdown signal received");
            }
        })
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}
