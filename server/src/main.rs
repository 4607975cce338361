//! Hookrelay Server - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use relay_server::api::{self, AppStateConfig, Stores};
use relay_server::{capture, config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Hookrelay Server");

    // Initialize database
    let db_pool = db::create_pool(config.require_database_url()?).await?;
    db::run_migrations(&db_pool).await?;
    let stores = Stores::postgres(&db_pool);

    // Build application state
    let state = api::AppState::new(AppStateConfig {
        config: config.clone(),
        db: Some(db_pool),
        stores,
        sender: None,
        validator: None,
    })
    .context("Failed to build application state")?;

    // Background capture cleanup
    let shutdown = CancellationToken::new();
    let cleanup = capture::spawn_cleanup_task(
        Arc::clone(&state.captures),
        config.capture_sweep_interval(),
        shutdown.clone(),
    );

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = {
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal, cleaning up...");
            shutdown.cancel();
        }
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    shutdown.cancel();
    if let Err(e) = cleanup.await {
        tracing::error!(error = %e, "Capture cleanup task ended abnormally");
    }

    info!("Server shutdown complete");

    Ok(())
}
