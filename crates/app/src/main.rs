mod developer;
mod error;
mod request;
mod router;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};

use chrono::Utc;
use dmaker_storage::Database;
use dmaker_util::{load_env_file, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    info!(stage = "app", url = %config.database_url, "database ready");

    let state = router::AppState::new(metrics, &database, Arc::new(Utc::now));

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| err.into())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(stage = "app", error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(stage = "app", "shutdown signal received");
}
