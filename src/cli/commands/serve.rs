use anyhow::Context;
use tracing::{info, warn};

use crate::cli::utils::open_pool;
use crate::config;
use crate::state::AppState;

pub async fn handle() -> anyhow::Result<()> {
    let config = config::config();
    info!("Starting Ordo in {:?} mode", config.environment);
    if crate::is_development!() {
        warn!("Development profile: fixed JWT secret and relaxed password hashing");
    }

    let pool = open_pool().await?;
    let app = crate::app(AppState::postgres(pool));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Ordo listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Ordo stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
